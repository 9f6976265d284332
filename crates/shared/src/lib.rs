pub mod events;
pub mod macros;
pub mod registry;
pub mod schemas;
pub mod toolbelts;

pub use registry::{get_tools, has_tool, use_tool};
pub use schemas::{ParameterSchema, Tool, ToolSchema};
