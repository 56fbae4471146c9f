//! Entities module - tag model
//!
//! A tag type is composed from capability bundles (fields + members); each
//! markup occurrence becomes an [`Entity`] of that type:
//! - `attrs` / `attr_schemas`: typed attribute schemas and validation
//! - `capability` / `mixins`: bundles and the shared control mixins
//! - `composer`: bundle merge into an [`EntityType`]
//! - `entity`: two-phase construction and member dispatch
//! - `annotation`: states shared by the entities of one document
//! - `tools` / `traits`: drawing tools owned by control tags

pub mod annotation;
pub mod attr_schemas;
pub mod attrs;
pub mod capability;
pub mod color;
pub mod composer;
pub mod entity;
pub mod keys;
pub mod mixins;
pub mod tools;
pub mod traits;
pub mod view;

pub use annotation::{Annotation, StateRef, StatesChanged};
pub use attrs::{AttrDef, AttrSchema, AttrType, AttrValue, Attrs, RawAttrs, ValidationPolicy};
pub use capability::{ActionContext, Capability, Member, MemberKind, StaticCapability};
pub use composer::{EntityType, Surface, compose};
pub use entity::{Entity, Phase};
pub use tools::{BuiltinTools, Tool, ToolConfig, ToolKind};
pub use traits::ToolFactory;
pub use view::ViewNode;
