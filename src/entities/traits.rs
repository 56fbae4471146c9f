//! Abstract traits for dependency inversion.
//!
//! Tags need a tools subsystem to create their drawing helpers, but the
//! drawing logic itself belongs to the host. Implementations live with the
//! host; [`BuiltinTools`](super::tools::BuiltinTools) is the default.

use std::sync::Arc;

use super::tools::{Tool, ToolConfig};

/// Tool creation contract consumed by lifecycle hooks.
pub trait ToolFactory: Send + Sync {
    /// Create a tool from config. The returned tool has no control yet;
    /// the caller links it back to its owning entity.
    fn create_tool(&self, config: ToolConfig) -> Tool;
}

/// Blanket impl: Arc<T> implements traits if T does
impl<T: ToolFactory + ?Sized> ToolFactory for Arc<T> {
    fn create_tool(&self, config: ToolConfig) -> Tool {
        (**self).create_tool(config)
    }
}
