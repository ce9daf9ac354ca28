//! Model Context Protocol client for remote tool catalogs.
//!
//! Wraps an rmcp running service over the streamable HTTP transport. Only
//! the calls needed to mirror a catalog are exposed: tool listing and
//! tool invocation.

use rmcp::model::{CallToolRequestParams, CallToolResult, PaginatedRequestParams, Tool};
use rmcp::service::{RoleClient, RunningService, ServiceExt};
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::ClientHandler;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Upper bound on `tools/list` pages followed for a single catalog.
pub const MAX_LIST_PAGES: usize = 64;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("Failed to initialize MCP connection: {0}")]
    Connect(String),
    #[error("MCP request failed: {0}")]
    Service(String),
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Tool arguments must be a JSON object, got {0}")]
    InvalidArguments(Value),
}

/// Client handler that ignores server requests and notifications.
///
/// The catalog only lists and calls tools, so nothing the server pushes
/// needs handling.
#[derive(Debug, Clone, Copy, Default)]
struct MinimalClientHandler;

impl ClientHandler for MinimalClientHandler {}

/// Connected session with one remote MCP server.
pub struct McpClient {
    endpoint: String,
    service: RunningService<RoleClient, MinimalClientHandler>,
}

impl McpClient {
    /// Connect and run the initialize handshake.
    ///
    /// The token is sent as `Authorization: Bearer <token>` on every request.
    pub async fn connect(endpoint: &str, bearer_token: Option<&str>) -> Result<Self, McpError> {
        let mut config = StreamableHttpClientTransportConfig::with_uri(endpoint.to_string());
        if let Some(token) = bearer_token {
            config = config.auth_header(token);
        }
        let transport = StreamableHttpClientTransport::from_config(config);

        let service = MinimalClientHandler
            .serve(transport)
            .await
            .map_err(|e| McpError::Connect(e.to_string()))?;

        if let Some(info) = service.peer_info() {
            tracing::debug!(
                "Connected to MCP server '{}' {} at {}",
                info.server_info.name,
                info.server_info.version,
                endpoint
            );
        }

        Ok(Self {
            endpoint: endpoint.to_string(),
            service,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Every tool in the catalog, following pagination cursors.
    ///
    /// A cursor the server already handed out, or more than
    /// [`MAX_LIST_PAGES`] pages, is a protocol error.
    pub async fn list_tools(&self) -> Result<Vec<Tool>, McpError> {
        let mut tools = Vec::new();
        let mut seen_cursors = HashSet::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let page = self
                .service
                .list_tools(Some(PaginatedRequestParams { meta: None, cursor }))
                .await
                .map_err(|e| McpError::Service(e.to_string()))?;
            tools.extend(page.tools);

            match page.next_cursor {
                None => return Ok(tools),
                Some(next) if next.is_empty() => return Ok(tools),
                Some(next) => {
                    if !seen_cursors.insert(next.clone()) {
                        return Err(McpError::Protocol(format!(
                            "tools/list repeated cursor '{}'",
                            next
                        )));
                    }
                    cursor = Some(next);
                }
            }
        }

        Err(McpError::Protocol(format!(
            "tools/list did not finish within {} pages",
            MAX_LIST_PAGES
        )))
    }

    pub async fn call_tool(&self, name: &str, args: Value) -> Result<CallToolResult, McpError> {
        let arguments = match args {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => return Err(McpError::InvalidArguments(other)),
        };

        self.service
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_string().into(),
                arguments,
                task: None,
            })
            .await
            .map_err(|e| McpError::Service(e.to_string()))
    }
}

/// Text parts of a tool result joined by newlines; non-text parts are skipped.
pub fn result_text(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|content| content.raw.as_text().map(|t| t.text.as_str()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::Content;

    #[test]
    fn test_result_text_skips_non_text_parts() {
        let result = CallToolResult::success(vec![
            Content::text("first"),
            Content::image("aGVsbG8=", "image/png"),
            Content::text("second"),
        ]);
        assert_eq!(result_text(&result), "first\nsecond");
    }

    #[test]
    fn test_error_result_keeps_text() {
        let result = CallToolResult::error(vec![Content::text("repository is archived")]);
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result_text(&result), "repository is archived");
    }
}
