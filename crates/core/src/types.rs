//! Conversation data model.

use serde::{Deserialize, Serialize};

/// Message role in the conversation.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the reasoning backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Backend-assigned correlation id, when the backend provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: None,
            name: name.into(),
            arguments,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Result of running a tool. Failures are data, not errors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", content = "payload", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success(String),
    Failure(String),
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success(_))
    }

    pub fn payload(&self) -> &str {
        match self {
            ToolOutcome::Success(text) | ToolOutcome::Failure(text) => text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    /// Carries the call it answers so backends can replay the exchange.
    ToolResult { call: ToolCall, outcome: ToolOutcome },
}

/// A single message in the conversation. History is append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<ContentPart>,
    pub timestamp: i64,
}

impl Message {
    pub fn new(role: Role, parts: Vec<ContentPart>) -> Self {
        Self {
            role,
            parts,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentPart::Text { text: text.into() }])
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![ContentPart::Text { text: text.into() }])
    }

    pub fn tool_result(call: ToolCall, outcome: ToolOutcome) -> Self {
        Self::new(Role::Tool, vec![ContentPart::ToolResult { call, outcome }])
    }

    /// Concatenated text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::ToolResult { .. } => None,
            })
            .collect()
    }

    /// The first tool result part, if any.
    pub fn tool_result_part(&self) -> Option<(&ToolCall, &ToolOutcome)> {
        self.parts.iter().find_map(|part| match part {
            ContentPart::ToolResult { call, outcome } => Some((call, outcome)),
            ContentPart::Text { .. } => None,
        })
    }
}

/// What the reasoning backend returned for one call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendReply {
    FinalAnswer(String),
    ToolCall(ToolCall),
}
