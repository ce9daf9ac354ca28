//! Session assembly: operations document, tool registry and engine.

use crate::config::AppConfig;
use orpheus_core::{ConversationEngine, DirectiveBuilder, Metrics, ReasoningBackend};
use orpheus_tools::{LocalCommandSource, RegistryBuild, RemoteCatalogSource, ToolRegistry, ToolSource};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to read operations document {}: {source}", path.display())]
    OperationsDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Read the operations document as-is. It is never parsed.
pub fn load_operations_document(path: &Path) -> Result<String, StartupError> {
    std::fs::read_to_string(path).map_err(|source| StartupError::OperationsDocument {
        path: path.to_path_buf(),
        source,
    })
}

/// Remote catalog first (when enabled), then the local command tools.
pub fn tool_sources(config: &AppConfig) -> Vec<Box<dyn ToolSource>> {
    let mut sources: Vec<Box<dyn ToolSource>> = Vec::new();
    if let Some(remote) = config.remote_catalog_config() {
        sources.push(Box::new(RemoteCatalogSource::new(remote)));
    }
    sources.push(Box::new(LocalCommandSource::new(
        config.settings.command_timeout(),
    )));
    sources
}

pub async fn build_registry(config: &AppConfig) -> RegistryBuild {
    ToolRegistry::build(tool_sources(config), config.settings.tools.collision_policy).await
}

/// Wire a ready engine from the merged registry and the operations text.
pub fn build_engine(
    config: &AppConfig,
    backend: Arc<dyn ReasoningBackend>,
    registry: ToolRegistry,
    operations: &str,
    metrics: Arc<Metrics>,
) -> ConversationEngine {
    let directive = DirectiveBuilder::new().build(&registry, operations);
    let session = &config.settings.session;

    ConversationEngine::new(backend, Arc::new(registry), directive)
        .with_sentinel(session.sentinel.clone())
        .with_max_tool_rounds(session.max_tool_rounds)
        .with_metrics(metrics)
}
