//! ANNOTAG - composable control tags for annotation configs
//!
//! Re-exports all modules for use by binary targets.

// Core (registry, events)
pub mod core;

// Tag model and concrete tags
pub mod entities;
pub mod tags;

// Host surface
pub mod cli;
pub mod config;
pub mod document;
pub mod error;

// Re-export commonly used types
pub use crate::core::event_bus::{BoxedEvent, EventBus, SubscriptionId, downcast_event};
pub use crate::core::registry::{RenderFn, TagEntry, TagRegistry, registry};
pub use document::Document;
pub use entities::{
    AttrValue, Attrs, Capability, Entity, EntityType, ValidationPolicy, compose,
};
pub use error::{DocumentError, TagError, ValidationError};
