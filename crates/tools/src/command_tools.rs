use crate::descriptor::ToolDescriptor;
use crate::traits::{ToolError, ToolHandler};
use async_trait::async_trait;
use orpheus_executor::CommandExecutor;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

pub const GCLOUD_TOOL_NAME: &str = "execute_gcloud_command";
pub const LINUX_TOOL_NAME: &str = "execute_linux_command";
pub const GCLOUD_PREFIX: &str = "gcloud";

#[derive(Deserialize)]
struct CommandInput {
    command: String,
}

/// Runs the `command` argument through a [`CommandExecutor`].
pub struct CommandTool {
    executor: CommandExecutor,
}

impl CommandTool {
    pub fn new(executor: CommandExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl ToolHandler for CommandTool {
    async fn invoke(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let input: CommandInput = serde_json::from_value(args)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        Ok(self.executor.execute(&input.command).await?)
    }
}

fn command_schema(hint: &str) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "command": {
                "type": "string",
                "description": hint
            }
        },
        "required": ["command"]
    })
}

/// Tool that only accepts command lines starting with `gcloud`.
pub fn gcloud_tool(timeout: Option<Duration>) -> ToolDescriptor {
    let executor = CommandExecutor::new()
        .with_required_prefix(GCLOUD_PREFIX)
        .with_timeout(timeout);

    ToolDescriptor::new(
        GCLOUD_TOOL_NAME,
        "Execute Google Cloud CLI commands",
        command_schema(
            "Full gcloud command line, starting with 'gcloud'. Split on whitespace; quoting is not supported",
        ),
        Arc::new(CommandTool::new(executor)),
    )
}

/// Tool that runs any program found on PATH.
pub fn linux_tool(timeout: Option<Duration>) -> ToolDescriptor {
    let executor = CommandExecutor::new().with_timeout(timeout);

    ToolDescriptor::new(
        LINUX_TOOL_NAME,
        "Execute Linux system commands",
        command_schema(
            "Program followed by its arguments. Split on whitespace; no shell features such as pipes or quoting",
        ),
        Arc::new(CommandTool::new(executor)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use orpheus_executor::ExecutorError;

    #[tokio::test]
    async fn test_gcloud_empty_command() {
        let tool = gcloud_tool(None);
        let result = tool.invoke(json!({"command": ""})).await;
        assert!(matches!(
            result,
            Err(ToolError::Executor(ExecutorError::EmptyCommand))
        ));
    }

    #[tokio::test]
    async fn test_linux_empty_command() {
        let tool = linux_tool(None);
        let result = tool.invoke(json!({"command": ""})).await;
        assert!(matches!(
            result,
            Err(ToolError::Executor(ExecutorError::EmptyCommand))
        ));
    }

    #[tokio::test]
    async fn test_gcloud_rejects_other_programs() {
        let tool = gcloud_tool(None);
        let result = tool.invoke(json!({"command": "notgcloud foo"})).await;
        assert!(matches!(
            result,
            Err(ToolError::Executor(ExecutorError::InvalidCommandPrefix { .. }))
        ));
    }

    #[tokio::test]
    async fn test_linux_tries_to_run_first_token() {
        let tool = linux_tool(None);
        let result = tool.invoke(json!({"command": "notgcloud foo"})).await;
        assert!(matches!(
            result,
            Err(ToolError::Executor(ExecutorError::SpawnFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_linux_echo() {
        let tool = linux_tool(None);
        let output = tool.invoke(json!({"command": "echo orpheus"})).await.unwrap();
        assert_eq!(output, "orpheus\n");
    }

    #[tokio::test]
    async fn test_missing_command_field() {
        let tool = linux_tool(None);
        let result = tool.invoke(json!({"cmd": "ls"})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[test]
    fn test_schema_requires_command() {
        let tool = gcloud_tool(None);
        assert_eq!(tool.input_schema()["required"], json!(["command"]));
        assert_eq!(tool.function_schema()["function"]["name"], GCLOUD_TOOL_NAME);
    }
}
