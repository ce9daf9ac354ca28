use super::{ToolSource, ToolSourceUnavailable};
use crate::descriptor::ToolDescriptor;
use crate::mcp::{result_text, McpClient, McpError};
use crate::traits::{ToolError, ToolHandler};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CATALOG_NAME: &str = "github";
pub const DEFAULT_CATALOG_URL: &str = "https://api.githubcopilot.com/mcp/";

/// Where the remote catalog lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct RemoteCatalogConfig {
    pub name: String,
    pub base_url: String,
    pub bearer_token: Option<String>,
    pub request_timeout: Duration,
}

impl RemoteCatalogConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            bearer_token: None,
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for RemoteCatalogConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CATALOG_NAME, DEFAULT_CATALOG_URL)
    }
}

/// Mirrors the tools advertised by a remote MCP server.
pub struct RemoteCatalogSource {
    config: RemoteCatalogConfig,
}

impl RemoteCatalogSource {
    pub fn new(config: RemoteCatalogConfig) -> Self {
        Self { config }
    }

    fn unavailable(&self, reason: impl ToString) -> ToolSourceUnavailable {
        ToolSourceUnavailable::new(&self.config.name, reason.to_string())
    }
}

#[async_trait]
impl ToolSource for RemoteCatalogSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn fetch_descriptors(&self) -> Result<Vec<ToolDescriptor>, ToolSourceUnavailable> {
        if self.config.bearer_token.is_none() {
            tracing::warn!(
                "No bearer credential for tool source '{}', connecting without one",
                self.config.name
            );
        }

        let timeout = self.config.request_timeout;
        let client = tokio::time::timeout(
            timeout,
            McpClient::connect(&self.config.base_url, self.config.bearer_token.as_deref()),
        )
        .await
        .map_err(|_| self.unavailable(format!("connection timed out after {:?}", timeout)))?
        .map_err(|e| self.unavailable(e))?;

        let remote_tools = tokio::time::timeout(timeout, client.list_tools())
            .await
            .map_err(|_| {
                self.unavailable(format!("tool listing timed out after {:?}", timeout))
            })?
            .map_err(|e| self.unavailable(e))?;

        tracing::info!(
            "Tool source '{}' advertised {} tools",
            self.config.name,
            remote_tools.len()
        );

        let client = Arc::new(client);
        let descriptors = remote_tools
            .into_iter()
            .map(|tool| {
                let schema = if tool.input_schema.is_empty() {
                    json!({ "type": "object", "properties": {} })
                } else {
                    Value::Object(tool.input_schema.as_ref().clone())
                };
                let handler = Arc::new(RemoteToolHandler {
                    client: Arc::clone(&client),
                    tool_name: tool.name.to_string(),
                    timeout,
                });

                ToolDescriptor::new(
                    tool.name.to_string(),
                    tool.description.map(|d| d.to_string()).unwrap_or_default(),
                    schema,
                    handler,
                )
                .with_origin(&self.config.name)
            })
            .collect();

        Ok(descriptors)
    }
}

/// Forwards an invocation to the remote server's `tools/call`.
struct RemoteToolHandler {
    client: Arc<McpClient>,
    tool_name: String,
    timeout: Duration,
}

#[async_trait]
impl ToolHandler for RemoteToolHandler {
    async fn invoke(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let call = self.client.call_tool(&self.tool_name, args);
        let result = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                ToolError::Remote(format!(
                    "{} timed out after {:?}",
                    self.client.endpoint(),
                    self.timeout
                ))
            })?
            .map_err(|e| match e {
                McpError::InvalidArguments(_) => ToolError::InvalidArguments(e.to_string()),
                other => ToolError::Remote(other.to_string()),
            })?;

        let text = result_text(&result);
        if result.is_error.unwrap_or(false) {
            return Err(ToolError::Remote(text));
        }

        Ok(text)
    }
}
