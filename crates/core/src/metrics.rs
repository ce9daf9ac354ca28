use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Session counters, shared between the engine and whoever reports on it.
#[derive(Default)]
pub struct Metrics {
    backend_requests: AtomicU64,
    backend_failures: AtomicU64,
    tool_invocations: AtomicU64,
    tool_failures: AtomicU64,
    unknown_tools: AtomicU64,
    turns_completed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_backend_requests(&self) {
        self.backend_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_backend_failures(&self) {
        self.backend_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_tool_invocations(&self) {
        self.tool_invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_tool_failures(&self) {
        self.tool_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_unknown_tools(&self) {
        self.unknown_tools.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_turns_completed(&self) {
        self.turns_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            backend_requests: self.backend_requests.load(Ordering::Relaxed),
            backend_failures: self.backend_failures.load(Ordering::Relaxed),
            tool_invocations: self.tool_invocations.load(Ordering::Relaxed),
            tool_failures: self.tool_failures.load(Ordering::Relaxed),
            unknown_tools: self.unknown_tools.load(Ordering::Relaxed),
            turns_completed: self.turns_completed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub backend_requests: u64,
    pub backend_failures: u64,
    pub tool_invocations: u64,
    pub tool_failures: u64,
    pub unknown_tools: u64,
    pub turns_completed: u64,
}

impl MetricsSnapshot {
    pub fn backend_success_rate(&self) -> f64 {
        if self.backend_requests == 0 {
            return 1.0;
        }
        1.0 - (self.backend_failures as f64 / self.backend_requests as f64)
    }

    pub fn tool_success_rate(&self) -> f64 {
        if self.tool_invocations == 0 {
            return 1.0;
        }
        1.0 - (self.tool_failures as f64 / self.tool_invocations as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_default_to_one() {
        let snapshot = Metrics::new().snapshot();
        assert_eq!(snapshot.backend_success_rate(), 1.0);
        assert_eq!(snapshot.tool_success_rate(), 1.0);
    }

    #[test]
    fn test_tool_success_rate() {
        let metrics = Metrics::new();
        for _ in 0..4 {
            metrics.inc_tool_invocations();
        }
        metrics.inc_tool_failures();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.tool_invocations, 4);
        assert!((snapshot.tool_success_rate() - 0.75).abs() < f64::EPSILON);
    }
}
