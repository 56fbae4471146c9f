//! Labels / Label - state tags.
//!
//! A `Labels` tag attaches itself as a state of its `toName` target when it
//! goes live, which is what control tags observe through `hasStates`.
//! `Label` children only carry a value and a color.

use log::debug;
use serde_json::Value;
use std::sync::Arc;

use crate::core::registry::TagRegistry;
use crate::entities::annotation::StateRef;
use crate::entities::attr_schemas::{LABEL_DEFS, LABELS_DEFS};
use crate::entities::capability::{ActionContext, Member, StaticCapability};
use crate::entities::composer::{EntityType, compose};
use crate::entities::entity::Entity;
use crate::entities::keys::*;
use crate::entities::mixins::{AnnotationMixin, ControlBase};
use crate::entities::view::ViewNode;
use crate::error::TagError;

pub const LABELS_TAG: &str = "labels";
pub const LABELS_MODEL: &str = "LabelsModel";
pub const LABEL_TAG: &str = "label";
pub const LABEL_MODEL: &str = "LabelModel";

// ============================================================================
// Labels
// ============================================================================

fn labels_type(_: &Entity) -> Value {
    Value::String(LABELS_TAG.to_string())
}

fn labels_after_create(entity: &mut Entity, _: &ActionContext<'_>) -> Result<(), TagError> {
    let Some(annotation) = entity.annotation() else {
        return Err(TagError::invariant(entity.label(), "not bound to an annotation"));
    };
    let (Some(name), Some(target)) = (entity.name(), entity.to_name()) else {
        return Err(TagError::invariant(entity.label(), "needs both name and toName"));
    };
    if annotation.attach_state(target, StateRef::new(name, LABELS_TAG)) {
        debug!("Labels `{}` attached to `{}`", name, target);
    }
    Ok(())
}

static LABELS_ATTRS: StaticCapability = StaticCapability::new("LabelsAttrs", LABELS_DEFS, &[]);

static LABELS_BASE: StaticCapability = StaticCapability::new(
    "LabelsModelBase",
    &[],
    &[
        Member::view(M_TYPE, labels_type),
        Member::action(M_AFTER_CREATE, labels_after_create),
    ],
);

pub fn labels_model() -> Result<EntityType, TagError> {
    compose(
        LABELS_MODEL,
        &[&ControlBase, &AnnotationMixin, &LABELS_ATTRS, &LABELS_BASE],
    )
}

pub fn render_labels(entity: &Entity) -> Option<ViewNode> {
    let mut node = ViewNode::new(LABELS_TAG);
    if let Some(name) = entity.name() {
        node = node.prop(A_NAME, name);
    }
    if let Some(target) = entity.to_name() {
        node = node.prop(A_TO_NAME, target);
    }
    if let Some(choice) = entity.attrs().get_str(A_CHOICE) {
        node = node.prop(A_CHOICE, choice);
    }
    Some(node)
}

// ============================================================================
// Label
// ============================================================================

fn label_type(_: &Entity) -> Value {
    Value::String(LABEL_TAG.to_string())
}

static LABEL_ATTRS: StaticCapability = StaticCapability::new("LabelAttrs", LABEL_DEFS, &[]);

static LABEL_BASE: StaticCapability =
    StaticCapability::new("LabelModelBase", &[], &[Member::view(M_TYPE, label_type)]);

pub fn label_model() -> Result<EntityType, TagError> {
    compose(LABEL_MODEL, &[&LABEL_ATTRS, &LABEL_BASE])
}

pub fn render_label(entity: &Entity) -> Option<ViewNode> {
    let attrs = entity.attrs();
    let mut node = ViewNode::new(LABEL_TAG);
    if let Some(value) = attrs.get_str(A_VALUE) {
        node = node.prop(A_VALUE, value);
    }
    if let Some(bg) = attrs.get_str(A_BACKGROUND) {
        node = node.prop(A_BACKGROUND, bg);
    }
    Some(node)
}

pub fn register(registry: &TagRegistry) -> Result<(), TagError> {
    registry.register(LABELS_TAG, Arc::new(labels_model()?), render_labels)?;
    registry.register(LABEL_TAG, Arc::new(label_model()?), render_label)
}
