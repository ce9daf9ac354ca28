use crate::backend::{BackendError, ReasoningBackend, ReasoningRequest};
use crate::directive::Directive;
use crate::metrics::Metrics;
use crate::types::{BackendReply, Message, ToolCall, ToolOutcome};
use orpheus_interfaces::Interface;
use orpheus_tools::{ToolError, ToolRegistry};
use std::sync::Arc;
use thiserror::Error;

pub const DEFAULT_SENTINEL: &str = "END";
pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 16;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("Tool round limit of {0} reached without a final answer")]
    MaxToolRounds(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingInput,
    Reasoning,
    SessionEnded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Sentinel,
    InputClosed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub turns: usize,
    pub failed_turns: usize,
    pub ended_by: SessionEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub answer: String,
    /// Tool sub-cycles performed before the answer arrived.
    pub tool_calls: usize,
}

/// Drives one conversation: owns the history and alternates between the
/// reasoning backend and tool dispatch until each turn yields an answer.
pub struct ConversationEngine {
    backend: Arc<dyn ReasoningBackend>,
    registry: Arc<ToolRegistry>,
    directive: Directive,
    history: Vec<Message>,
    state: SessionState,
    sentinel: String,
    max_tool_rounds: usize,
    metrics: Arc<Metrics>,
}

impl ConversationEngine {
    pub fn new(
        backend: Arc<dyn ReasoningBackend>,
        registry: Arc<ToolRegistry>,
        directive: Directive,
    ) -> Self {
        Self {
            backend,
            registry,
            directive,
            history: Vec::new(),
            state: SessionState::AwaitingInput,
            sentinel: DEFAULT_SENTINEL.to_string(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            metrics: Metrics::new(),
        }
    }

    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = sentinel.into();
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn directive(&self) -> &Directive {
        &self.directive
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Run a single turn without an interface attached.
    pub async fn submit(&mut self, input: &str) -> Result<TurnOutcome, EngineError> {
        self.run_turn(input, None).await
    }

    /// Read lines from `interface` until the sentinel or end of input.
    ///
    /// Only a line exactly equal to the sentinel ends the session; other
    /// lines are stored as typed. Whitespace-only lines are skipped.
    ///
    /// Turn failures are shown to the user and the session carries on.
    pub async fn run(&mut self, interface: &dyn Interface) -> SessionSummary {
        let mut turns = 0;
        let mut failed_turns = 0;

        let ended_by = loop {
            self.state = SessionState::AwaitingInput;

            let Some(line) = interface.receive_input().await else {
                tracing::info!("Input closed, ending session");
                break SessionEnd::InputClosed;
            };

            if line.trim().is_empty() {
                continue;
            }
            if line == self.sentinel {
                interface.send_output("Exiting chat...").await;
                break SessionEnd::Sentinel;
            }

            turns += 1;
            match self.run_turn(&line, Some(interface)).await {
                Ok(outcome) => interface.send_output(&outcome.answer).await,
                Err(e) => {
                    failed_turns += 1;
                    interface.show_error(&e.to_string()).await;
                }
            }
        };

        self.state = SessionState::SessionEnded;
        SessionSummary {
            turns,
            failed_turns,
            ended_by,
        }
    }

    async fn run_turn(
        &mut self,
        input: &str,
        interface: Option<&dyn Interface>,
    ) -> Result<TurnOutcome, EngineError> {
        self.state = SessionState::Reasoning;
        self.history.push(Message::user(input));

        let result = self.reason(interface).await;
        self.state = SessionState::AwaitingInput;

        match &result {
            Ok(outcome) => {
                self.metrics.inc_turns_completed();
                tracing::info!("Turn completed after {} tool calls", outcome.tool_calls);
            }
            Err(e) => tracing::debug!("Turn failed: {}", e),
        }
        result
    }

    async fn reason(&mut self, interface: Option<&dyn Interface>) -> Result<TurnOutcome, EngineError> {
        let mut tool_calls = 0;

        loop {
            tracing::debug!(
                "Backend request {} for this turn ({} messages)",
                tool_calls + 1,
                self.history.len()
            );

            self.metrics.inc_backend_requests();
            let request = ReasoningRequest {
                directive: &self.directive,
                history: &self.history,
                tools: &self.registry,
            };
            let reply = match self.backend.generate(request).await {
                Ok(reply) => reply,
                Err(e) => {
                    self.metrics.inc_backend_failures();
                    return Err(e.into());
                }
            };

            match reply {
                BackendReply::FinalAnswer(answer) => {
                    self.history.push(Message::assistant(answer.clone()));
                    return Ok(TurnOutcome { answer, tool_calls });
                }
                BackendReply::ToolCall(call) => {
                    if tool_calls >= self.max_tool_rounds {
                        return Err(EngineError::MaxToolRounds(self.max_tool_rounds));
                    }
                    tool_calls += 1;

                    if let Some(interface) = interface {
                        interface.show_status(&describe_call(&call)).await;
                    }
                    let outcome = self.dispatch(&call).await;
                    self.history.push(Message::tool_result(call, outcome));
                }
            }
        }
    }

    /// Every tool failure becomes data for the backend to reason about.
    async fn dispatch(&self, call: &ToolCall) -> ToolOutcome {
        tracing::info!("Executing tool: {} {}", call.name, call.arguments);
        self.metrics.inc_tool_invocations();

        match self.registry.invoke(&call.name, call.arguments.clone()).await {
            Ok(output) => ToolOutcome::Success(output),
            Err(e) => {
                self.metrics.inc_tool_failures();
                if matches!(e, ToolError::UnknownTool(_)) {
                    self.metrics.inc_unknown_tools();
                }
                tracing::warn!("Tool {} failed: {}", call.name, e);
                ToolOutcome::Failure(e.to_string())
            }
        }
    }
}

fn describe_call(call: &ToolCall) -> String {
    match call.arguments.get("command").and_then(|v| v.as_str()) {
        Some(command) => format!("Running {}: {}", call.name, command),
        None => format!("Running {} with {}", call.name, call.arguments),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_describe_command_call() {
        let call = ToolCall::new("execute_linux_command", json!({"command": "uptime"}));
        assert_eq!(describe_call(&call), "Running execute_linux_command: uptime");
    }

    #[test]
    fn test_describe_other_call() {
        let call = ToolCall::new("list_repos", json!({"owner": "acme"}));
        assert_eq!(describe_call(&call), r#"Running list_repos with {"owner":"acme"}"#);
    }
}
