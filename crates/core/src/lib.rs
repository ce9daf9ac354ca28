pub mod backend;
pub mod conversation;
pub mod directive;
pub mod metrics;
pub mod types;

pub use backend::{BackendError, ReasoningBackend, ReasoningRequest};
pub use conversation::{
    ConversationEngine, EngineError, SessionEnd, SessionState, SessionSummary, TurnOutcome,
    DEFAULT_MAX_TOOL_ROUNDS, DEFAULT_SENTINEL,
};
pub use directive::{Directive, DirectiveBuilder};
pub use metrics::{Metrics, MetricsSnapshot};
pub use types::*;
