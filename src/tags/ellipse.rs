//! Ellipse - control tag for drawing elliptical regions on an image.
//!
//! Composed from the shared control mixins plus two tag-local bundles:
//! its attribute fields and its model members (`type`, `hasStates`,
//! `afterCreate`). The lifecycle hook creates one ellipse tool carrying the
//! tag's style attributes and links it back to the entity.
//!
//! Ellipse draws nothing itself; its render function returns `None`.

use log::trace;
use serde_json::Value;
use std::sync::Arc;

use crate::core::registry::TagRegistry;
use crate::entities::attr_schemas::ELLIPSE_DEFS;
use crate::entities::attrs::Attrs;
use crate::entities::capability::{ActionContext, Member, StaticCapability};
use crate::entities::composer::{EntityType, compose};
use crate::entities::entity::Entity;
use crate::entities::keys::*;
use crate::entities::mixins::{AnnotationMixin, ControlBase, SeparatedControlMixin};
use crate::entities::tools::{ToolConfig, ToolKind};
use crate::entities::view::ViewNode;
use crate::error::TagError;

/// Markup tag name.
pub const TAG: &str = "ellipse";

/// Name of the composed type.
pub const MODEL: &str = "EllipseModel";

/// Typed view over validated Ellipse attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct EllipseAttrs {
    pub name: String,
    pub to_name: Option<String>,
    pub opacity: f32,
    pub fill_color: String,
    /// Kept in string form, as declared
    pub stroke_width: String,
    pub stroke_color: String,
    pub fill_opacity: f32,
    pub can_rotate: bool,
}

impl Default for EllipseAttrs {
    fn default() -> Self {
        Self {
            name: String::new(),
            to_name: None,
            opacity: 1.0,
            fill_color: "#f48a42".to_string(),
            stroke_width: "1".to_string(),
            stroke_color: "#f48a42".to_string(),
            fill_opacity: 0.2,
            can_rotate: true,
        }
    }
}

impl EllipseAttrs {
    /// Read from a validated record, falling back to defaults for absent keys.
    pub fn from_attrs(attrs: &Attrs) -> Self {
        let d = Self::default();
        Self {
            name: attrs.get_str(A_NAME).map(str::to_string).unwrap_or(d.name),
            to_name: attrs
                .get_str(A_TO_NAME)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            opacity: attrs.get_float_or(A_OPACITY, d.opacity),
            fill_color: attrs.get_str(A_FILL_COLOR).map(str::to_string).unwrap_or(d.fill_color),
            stroke_width: attrs
                .get_str(A_STROKE_WIDTH)
                .map(str::to_string)
                .unwrap_or(d.stroke_width),
            stroke_color: attrs
                .get_str(A_STROKE_COLOR)
                .map(str::to_string)
                .unwrap_or(d.stroke_color),
            fill_opacity: attrs.get_float_or(A_FILL_OPACITY, d.fill_opacity),
            can_rotate: attrs.get_bool_or(A_CAN_ROTATE, d.can_rotate),
        }
    }
}

// ========== Members ==========

fn type_view(_: &Entity) -> Value {
    Value::String(TAG.to_string())
}

fn has_states_view(entity: &Entity) -> Value {
    Value::Bool(entity.has_states())
}

fn after_create(entity: &mut Entity, ctx: &ActionContext<'_>) -> Result<(), TagError> {
    let config = ToolConfig::new(ToolKind::Ellipse).with_style(entity.style());
    let tool = ctx.tools.create_tool(config);
    trace!("{} `{}`: attaching tool {}", MODEL, entity.label(), tool.id());
    entity.attach_tool(tool)
}

static ELLIPSE_ATTRS: StaticCapability = StaticCapability::new("EllipseAttrs", ELLIPSE_DEFS, &[]);

static ELLIPSE_MODEL: StaticCapability = StaticCapability::new(
    "EllipseModelBase",
    &[],
    &[
        Member::view(M_TYPE, type_view),
        Member::view(M_HAS_STATES, has_states_view),
        Member::action(M_AFTER_CREATE, after_create),
    ],
);

/// Compose the Ellipse entity type.
pub fn ellipse_model() -> Result<EntityType, TagError> {
    compose(
        MODEL,
        &[
            &ControlBase,
            &AnnotationMixin,
            &SeparatedControlMixin,
            &ELLIPSE_ATTRS,
            &ELLIPSE_MODEL,
        ],
    )
}

/// Ellipse has no view of its own; its regions are drawn by the image.
pub fn render(_: &Entity) -> Option<ViewNode> {
    None
}

pub fn register(registry: &TagRegistry) -> Result<(), TagError> {
    registry.register(TAG, Arc::new(ellipse_model()?), render)
}
