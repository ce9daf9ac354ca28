use crate::directive::Directive;
use crate::types::{BackendReply, Message};
use async_trait::async_trait;
use orpheus_tools::ToolRegistry;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl BackendError {
    /// Worth retrying: transport failures, rate limits and server errors.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Http(_) => true,
            BackendError::Api { status, .. } => *status == 429 || *status >= 500,
            BackendError::MalformedResponse(_) => false,
        }
    }
}

/// Everything the backend sees for one call. The backend keeps no state
/// between calls.
#[derive(Clone, Copy)]
pub struct ReasoningRequest<'a> {
    pub directive: &'a Directive,
    pub history: &'a [Message],
    pub tools: &'a ToolRegistry,
}

#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    async fn generate(&self, request: ReasoningRequest<'_>) -> Result<BackendReply, BackendError>;

    fn name(&self) -> &str;
}
