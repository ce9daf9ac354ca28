//! Origins of tool descriptors, consulted once while the registry is built.

pub mod local;
pub mod remote;

pub use local::LocalCommandSource;
pub use remote::{RemoteCatalogConfig, RemoteCatalogSource};

use crate::descriptor::ToolDescriptor;
use async_trait::async_trait;
use thiserror::Error;

/// A tool source could not be reached or authenticated.
#[derive(Debug, Clone, Error)]
#[error("Tool source '{source_name}' unavailable: {reason}")]
pub struct ToolSourceUnavailable {
    pub source_name: String,
    pub reason: String,
}

impl ToolSourceUnavailable {
    pub fn new(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
pub trait ToolSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_descriptors(&self) -> Result<Vec<ToolDescriptor>, ToolSourceUnavailable>;
}
