use async_trait::async_trait;
use orpheus_core::{
    BackendError, BackendReply, ContentPart, Directive, Message, ReasoningBackend,
    ReasoningRequest, Role, ToolCall, ToolOutcome,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Gemini's OpenAI-compatible surface.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_MAX_RETRIES: u32 = 2;

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_retries: u32,
    pub request_timeout: Duration,
    /// First retry delay; doubles on each further attempt.
    pub retry_base_delay: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout: Duration::from_secs(120),
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: Option<String>,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Option<String>,
}

/// Chat-completions backend for any OpenAI-compatible endpoint.
pub struct OpenAICompatibleBackend {
    client: Client,
    config: BackendConfig,
}

impl OpenAICompatibleBackend {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| BackendError::Http(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        self.config
            .retry_base_delay
            .saturating_mul(2_u32.saturating_pow(attempt))
            .min(Duration::from_secs(30))
    }

    async fn call_once(&self, body: &Value) -> Result<BackendReply, BackendError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

        let mut request = self.client.post(&url).json(body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(BackendError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_completion(&text)
    }
}

#[async_trait]
impl ReasoningBackend for OpenAICompatibleBackend {
    async fn generate(&self, request: ReasoningRequest<'_>) -> Result<BackendReply, BackendError> {
        let body = build_request_body(&self.config.model, request);

        let mut attempt = 0;
        loop {
            debug!(
                "Chat completion attempt {}/{}",
                attempt + 1,
                self.config.max_retries + 1
            );

            match self.call_once(&body).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    let delay = self.retry_delay(attempt);
                    warn!(
                        "Chat completion failed (attempt {}): {}; retrying in {:?}",
                        attempt + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn name(&self) -> &str {
        "OpenAI Compatible"
    }
}

fn build_request_body(model: &str, request: ReasoningRequest<'_>) -> Value {
    let mut body = json!({
        "model": model,
        "messages": build_messages(request.directive, request.history),
    });

    if !request.tools.is_empty() {
        body["tools"] = json!(request.tools.schemas());
    }
    body
}

/// Directive first, then the history. Each tool result is replayed as the
/// assistant call that requested it followed by the `tool` reply.
fn build_messages(directive: &Directive, history: &[Message]) -> Vec<Value> {
    let mut messages = vec![json!({
        "role": "system",
        "content": directive.as_str()
    })];

    for (index, message) in history.iter().enumerate() {
        match message.role {
            Role::User => messages.push(json!({ "role": "user", "content": message.text() })),
            Role::Assistant => {
                messages.push(json!({ "role": "assistant", "content": message.text() }))
            }
            Role::Tool => {
                for part in &message.parts {
                    let ContentPart::ToolResult { call, outcome } = part else {
                        continue;
                    };
                    let call_id = call
                        .id
                        .clone()
                        .unwrap_or_else(|| format!("call_{}", index));

                    messages.push(json!({
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": call_id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments.to_string()
                            }
                        }]
                    }));
                    messages.push(json!({
                        "role": "tool",
                        "tool_call_id": call_id,
                        "content": tool_content(outcome)
                    }));
                }
            }
        }
    }

    messages
}

fn tool_content(outcome: &ToolOutcome) -> String {
    match outcome {
        ToolOutcome::Success(output) => output.clone(),
        ToolOutcome::Failure(error) => format!("Error: {}", error),
    }
}

fn parse_completion(body: &str) -> Result<BackendReply, BackendError> {
    let completion: ChatCompletion = serde_json::from_str(body)
        .map_err(|e| BackendError::MalformedResponse(format!("invalid completion body: {}", e)))?;

    let message = completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| BackendError::MalformedResponse("no choices in response".to_string()))?;

    let mut calls = message.tool_calls.unwrap_or_default();
    if !calls.is_empty() {
        if calls.len() > 1 {
            let dropped: Vec<&str> = calls[1..].iter().map(|c| c.function.name.as_str()).collect();
            warn!(
                "Model requested {} tool calls; running the first and dropping {:?}",
                calls.len(),
                dropped
            );
        }
        let first = calls.swap_remove(0);
        return Ok(BackendReply::ToolCall(into_tool_call(first)?));
    }

    message
        .content
        .map(BackendReply::FinalAnswer)
        .ok_or_else(|| {
            BackendError::MalformedResponse("response has neither content nor tool calls".to_string())
        })
}

fn into_tool_call(wire: WireToolCall) -> Result<ToolCall, BackendError> {
    let arguments = match wire.function.arguments.as_deref().map(str::trim) {
        None | Some("") => json!({}),
        Some(raw) => serde_json::from_str(raw).map_err(|e| {
            BackendError::MalformedResponse(format!(
                "arguments for '{}' are not valid JSON: {}",
                wire.function.name, e
            ))
        })?,
    };

    let call = ToolCall::new(wire.function.name, arguments);
    Ok(match wire.id {
        Some(id) => call.with_id(id),
        None => call,
    })
}
