use super::{ToolSource, ToolSourceUnavailable};
use crate::command_tools::{gcloud_tool, linux_tool};
use crate::descriptor::ToolDescriptor;
use async_trait::async_trait;
use std::time::Duration;

pub const LOCAL_SOURCE_NAME: &str = "local";

/// The always-present command tools: gcloud first, then the general one.
#[derive(Debug, Clone, Default)]
pub struct LocalCommandSource {
    timeout: Option<Duration>,
}

impl LocalCommandSource {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        vec![
            gcloud_tool(self.timeout).with_origin(LOCAL_SOURCE_NAME),
            linux_tool(self.timeout).with_origin(LOCAL_SOURCE_NAME),
        ]
    }
}

#[async_trait]
impl ToolSource for LocalCommandSource {
    fn name(&self) -> &str {
        LOCAL_SOURCE_NAME
    }

    async fn fetch_descriptors(&self) -> Result<Vec<ToolDescriptor>, ToolSourceUnavailable> {
        Ok(self.descriptors())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_tools::{GCLOUD_TOOL_NAME, LINUX_TOOL_NAME};

    #[tokio::test]
    async fn test_local_source_order() {
        let source = LocalCommandSource::new(None);
        let tools = source.fetch_descriptors().await.unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec![GCLOUD_TOOL_NAME, LINUX_TOOL_NAME]);
        assert!(tools.iter().all(|t| t.origin() == LOCAL_SOURCE_NAME));
    }
}
