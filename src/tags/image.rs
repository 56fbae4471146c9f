//! Image - object tag, the labeling target that controls point at via `toName`.

use serde_json::Value;
use std::sync::Arc;

use crate::core::registry::TagRegistry;
use crate::entities::attr_schemas::IMAGE_DEFS;
use crate::entities::capability::{Member, StaticCapability};
use crate::entities::composer::{EntityType, compose};
use crate::entities::entity::Entity;
use crate::entities::keys::*;
use crate::entities::view::ViewNode;
use crate::error::TagError;

pub const TAG: &str = "image";
pub const MODEL: &str = "ImageModel";

fn type_view(_: &Entity) -> Value {
    Value::String(TAG.to_string())
}

/// Whether the object is a target for control tags.
fn is_object_tag(_: &Entity) -> Value {
    Value::Bool(true)
}

static IMAGE_ATTRS: StaticCapability = StaticCapability::new("ImageAttrs", IMAGE_DEFS, &[]);

static IMAGE_MODEL: StaticCapability = StaticCapability::new(
    "ImageModelBase",
    &[],
    &[
        Member::view(M_TYPE, type_view),
        Member::view("isObjectTag", is_object_tag),
    ],
);

pub fn image_model() -> Result<EntityType, TagError> {
    compose(MODEL, &[&IMAGE_ATTRS, &IMAGE_MODEL])
}

pub fn render(entity: &Entity) -> Option<ViewNode> {
    let attrs = entity.attrs();
    let mut node = ViewNode::new(TAG);
    if let Some(name) = entity.name() {
        node = node.prop(A_NAME, name);
    }
    if let Some(src) = attrs.get_str(A_VALUE) {
        node = node.prop("src", src);
    }
    if let Some(width) = attrs.get_str(A_WIDTH) {
        node = node.prop(A_WIDTH, width);
    }
    node = node.prop(A_ZOOM, attrs.get_bool_or(A_ZOOM, true).to_string());
    Some(node)
}

pub fn register(registry: &TagRegistry) -> Result<(), TagError> {
    registry.register(TAG, Arc::new(image_model()?), render)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::attrs::{RawAttrs, ValidationPolicy};
    use crate::error::ValidationError;

    fn raw(pairs: &[(&str, &str)]) -> RawAttrs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_with_defaults() {
        let ty = Arc::new(image_model().unwrap());
        let e = ty
            .instantiate(&raw(&[("name", "img1"), ("value", "$img")]), ValidationPolicy::Strict)
            .unwrap();
        let node = render(&e).unwrap();
        assert_eq!(node.kind, "image");
        assert_eq!(node.props["name"], "img1");
        assert_eq!(node.props["src"], "$img");
        assert_eq!(node.props["width"], "100%");
        assert_eq!(node.props["zoom"], "true");
    }

    #[test]
    fn test_value_is_required() {
        let ty = Arc::new(image_model().unwrap());
        let err = ty
            .instantiate(&raw(&[("name", "img1")]), ValidationPolicy::Strict)
            .unwrap_err();
        assert_eq!(
            err,
            TagError::Validation(ValidationError::Missing {
                field: "value".into()
            })
        );
    }
}
