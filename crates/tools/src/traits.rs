use async_trait::async_trait;
use orpheus_executor::ExecutorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    #[error("Remote tool error: {0}")]
    Remote(String),
}

/// The invocation capability bound to a descriptor at registration time.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn invoke(&self, args: serde_json::Value) -> Result<String, ToolError>;
}
