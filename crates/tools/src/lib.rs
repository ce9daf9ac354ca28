pub mod command_tools;
pub mod descriptor;
pub mod mcp;
pub mod registry;
pub mod sources;
pub mod traits;

pub use descriptor::ToolDescriptor;
pub use registry::{CollisionPolicy, Registration, RegistryBuild, ToolRegistry};
pub use sources::{
    LocalCommandSource, RemoteCatalogConfig, RemoteCatalogSource, ToolSource, ToolSourceUnavailable,
};
pub use traits::{ToolError, ToolHandler};
