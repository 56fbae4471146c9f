//! View - layout container. Declares no attributes.

use serde_json::Value;
use std::sync::Arc;

use crate::core::registry::TagRegistry;
use crate::entities::capability::{Member, StaticCapability};
use crate::entities::composer::{EntityType, compose};
use crate::entities::entity::Entity;
use crate::entities::keys::M_TYPE;
use crate::entities::view::ViewNode;
use crate::error::TagError;

pub const TAG: &str = "view";
pub const MODEL: &str = "ViewModel";

fn type_view(_: &Entity) -> Value {
    Value::String(TAG.to_string())
}

static VIEW_BASE: StaticCapability =
    StaticCapability::new("ViewModelBase", &[], &[Member::view(M_TYPE, type_view)]);

pub fn view_model() -> Result<EntityType, TagError> {
    compose(MODEL, &[&VIEW_BASE])
}

pub fn render(_: &Entity) -> Option<ViewNode> {
    Some(ViewNode::new(TAG))
}

pub fn register(registry: &TagRegistry) -> Result<(), TagError> {
    registry.register(TAG, Arc::new(view_model()?), render)
}
