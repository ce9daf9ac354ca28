use crate::descriptor::ToolDescriptor;
use crate::sources::{ToolSource, ToolSourceUnavailable};
use crate::traits::ToolError;
use serde::Deserialize;
use std::collections::HashMap;

/// What happens when a descriptor's name is already registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Keep the earlier descriptor and drop the newcomer.
    #[default]
    KeepFirst,
    /// Replace the earlier descriptor in place (last write wins).
    ReplaceExisting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    Replaced,
    Dropped,
}

/// Result of merging every tool source.
pub struct RegistryBuild {
    pub registry: ToolRegistry,
    pub diagnostics: Vec<ToolSourceUnavailable>,
}

/// Name-addressable tool set. Iteration follows first registration order.
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
    policy: CollisionPolicy,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::with_policy(CollisionPolicy::default())
    }

    pub fn with_policy(policy: CollisionPolicy) -> Self {
        Self {
            tools: Vec::new(),
            index: HashMap::new(),
            policy,
        }
    }

    /// Fetch every source concurrently, then merge them in the given order.
    ///
    /// A failing source contributes no tools and one diagnostic.
    pub async fn build(sources: Vec<Box<dyn ToolSource>>, policy: CollisionPolicy) -> RegistryBuild {
        let fetched =
            futures::future::join_all(sources.iter().map(|source| source.fetch_descriptors())).await;

        let mut registry = Self::with_policy(policy);
        let mut diagnostics = Vec::new();

        for (source, result) in sources.iter().zip(fetched) {
            match result {
                Ok(descriptors) => {
                    tracing::debug!(
                        "Merging {} tools from source '{}'",
                        descriptors.len(),
                        source.name()
                    );
                    for descriptor in descriptors {
                        registry.register(descriptor);
                    }
                }
                Err(unavailable) => {
                    tracing::warn!("{}", unavailable);
                    diagnostics.push(unavailable);
                }
            }
        }

        tracing::info!("Tool registry ready with {} tools", registry.len());
        RegistryBuild {
            registry,
            diagnostics,
        }
    }

    pub fn register(&mut self, descriptor: ToolDescriptor) -> Registration {
        let Some(&position) = self.index.get(descriptor.name()) else {
            self.index
                .insert(descriptor.name().to_string(), self.tools.len());
            self.tools.push(descriptor);
            return Registration::Added;
        };

        let existing = &self.tools[position];
        match self.policy {
            CollisionPolicy::KeepFirst => {
                tracing::warn!(
                    "Tool name conflict on '{}': keeping the one from '{}', dropping the one from '{}'",
                    descriptor.name(),
                    existing.origin(),
                    descriptor.origin()
                );
                Registration::Dropped
            }
            CollisionPolicy::ReplaceExisting => {
                tracing::warn!(
                    "Tool name conflict on '{}': '{}' replaces the one from '{}'",
                    descriptor.name(),
                    descriptor.origin(),
                    existing.origin()
                );
                self.tools[position] = descriptor;
                Registration::Replaced
            }
        }
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&position| &self.tools[position])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn schemas(&self) -> Vec<serde_json::Value> {
        self.tools.iter().map(ToolDescriptor::function_schema).collect()
    }

    /// Run the named tool. Unresolved names yield [`ToolError::UnknownTool`].
    pub async fn invoke(&self, name: &str, args: serde_json::Value) -> Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.invoke(args).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
