//! Core modules - tag registry and event bus
//!
//! Process-wide plumbing shared by every document, independent of any tag.

pub mod event_bus;
pub mod registry;

// Re-exports for convenience
pub use event_bus::EventBus;
pub use registry::{TagRegistry, registry};
