use crate::traits::Interface;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedOutput {
    Text(String),
    Status(String),
    Error(String),
}

/// In-memory interface fed from a fixed list of input lines.
///
/// Everything written to it is recorded for later inspection.
#[derive(Default)]
pub struct ScriptedInterface {
    inputs: Mutex<VecDeque<String>>,
    outputs: Mutex<Vec<ScriptedOutput>>,
    reads: Mutex<usize>,
}

impl ScriptedInterface {
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: Mutex::new(inputs.into_iter().map(Into::into).collect()),
            outputs: Mutex::new(Vec::new()),
            reads: Mutex::new(0),
        }
    }

    pub fn outputs(&self) -> Vec<ScriptedOutput> {
        self.outputs.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.filtered(|output| match output {
            ScriptedOutput::Text(text) => Some(text.clone()),
            _ => None,
        })
    }

    pub fn statuses(&self) -> Vec<String> {
        self.filtered(|output| match output {
            ScriptedOutput::Status(text) => Some(text.clone()),
            _ => None,
        })
    }

    pub fn errors(&self) -> Vec<String> {
        self.filtered(|output| match output {
            ScriptedOutput::Error(text) => Some(text.clone()),
            _ => None,
        })
    }

    /// Number of times input was requested, including the final `None`.
    pub fn reads(&self) -> usize {
        *self.reads.lock()
    }

    pub fn remaining_inputs(&self) -> usize {
        self.inputs.lock().len()
    }

    fn filtered(&self, pick: impl Fn(&ScriptedOutput) -> Option<String>) -> Vec<String> {
        self.outputs.lock().iter().filter_map(pick).collect()
    }
}

#[async_trait]
impl Interface for ScriptedInterface {
    async fn receive_input(&self) -> Option<String> {
        *self.reads.lock() += 1;
        self.inputs.lock().pop_front()
    }

    async fn send_output(&self, message: &str) {
        self.outputs
            .lock()
            .push(ScriptedOutput::Text(message.to_string()));
    }

    async fn show_status(&self, status: &str) {
        self.outputs
            .lock()
            .push(ScriptedOutput::Status(status.to_string()));
    }

    async fn show_error(&self, error: &str) {
        self.outputs
            .lock()
            .push(ScriptedOutput::Error(error.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inputs_then_eof() {
        let interface = ScriptedInterface::new(["first", "second"]);
        assert_eq!(interface.receive_input().await.as_deref(), Some("first"));
        assert_eq!(interface.receive_input().await.as_deref(), Some("second"));
        assert_eq!(interface.receive_input().await, None);
        assert_eq!(interface.reads(), 3);
    }

    #[tokio::test]
    async fn test_outputs_are_recorded_in_order() {
        let interface = ScriptedInterface::new(Vec::<String>::new());
        interface.show_status("working").await;
        interface.send_output("done").await;
        interface.show_error("oops").await;

        assert_eq!(
            interface.outputs(),
            vec![
                ScriptedOutput::Status("working".to_string()),
                ScriptedOutput::Text("done".to_string()),
                ScriptedOutput::Error("oops".to_string()),
            ]
        );
        assert_eq!(interface.texts(), vec!["done"]);
        assert_eq!(interface.errors(), vec!["oops"]);
    }
}
