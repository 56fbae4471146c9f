//! Shared capability bundles mixed into control tags.
//!
//! | Bundle | Members |
//! |--------|---------|
//! | `ControlBase` | `isControlTag`, `controlId` |
//! | `AnnotationMixin` | `annotation`, `states` |
//! | `SeparatedControlMixin` | `isSeparated`, `obj` |

use serde_json::{Value, json};

use super::capability::{Capability, Member};
use super::entity::Entity;

// ============================================================================
// ControlBase
// ============================================================================

/// Identity plumbing shared by every control tag.
#[derive(Debug, Default, Clone, Copy)]
pub struct ControlBase;

fn is_control_tag(_: &Entity) -> Value {
    Value::Bool(true)
}

fn control_id(entity: &Entity) -> Value {
    json!(entity.id())
}

const CONTROL_BASE_MEMBERS: &[Member] = &[
    Member::view("isControlTag", is_control_tag),
    Member::view("controlId", control_id),
];

impl Capability for ControlBase {
    fn name(&self) -> &str {
        "ControlBase"
    }

    fn members(&self) -> &[Member] {
        CONTROL_BASE_MEMBERS
    }
}

// ============================================================================
// AnnotationMixin
// ============================================================================

/// Exposes the annotation an entity is bound to and the states visible to it.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnnotationMixin;

fn annotation_id(entity: &Entity) -> Value {
    entity.annotation().map_or(Value::Null, |a| json!(a.id()))
}

fn state_names(entity: &Entity) -> Value {
    Value::Array(
        entity
            .states()
            .into_iter()
            .map(|s| Value::String(s.name))
            .collect(),
    )
}

const ANNOTATION_MEMBERS: &[Member] = &[
    Member::view("annotation", annotation_id),
    Member::view("states", state_names),
];

impl Capability for AnnotationMixin {
    fn name(&self) -> &str {
        "AnnotationMixin"
    }

    fn members(&self) -> &[Member] {
        ANNOTATION_MEMBERS
    }
}

// ============================================================================
// SeparatedControlMixin
// ============================================================================

/// Marks a control whose regions are tracked per annotation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeparatedControlMixin;

fn is_separated(_: &Entity) -> Value {
    Value::Bool(true)
}

fn target_object(entity: &Entity) -> Value {
    entity.to_name().map_or(Value::Null, |t| Value::String(t.to_string()))
}

const SEPARATED_MEMBERS: &[Member] = &[
    Member::view("isSeparated", is_separated),
    Member::view("obj", target_object),
];

impl Capability for SeparatedControlMixin {
    fn name(&self) -> &str {
        "SeparatedControlMixin"
    }

    fn members(&self) -> &[Member] {
        SEPARATED_MEMBERS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::annotation::{Annotation, StateRef};
    use crate::entities::attrs::{AttrDef, AttrType, RawAttrs, ValidationPolicy};
    use crate::entities::capability::StaticCapability;
    use crate::entities::composer::compose;
    use std::sync::Arc;

    const FIELDS: &[AttrDef] = &[
        AttrDef::new("name", AttrType::Identifier, 0),
        AttrDef::new("toname", AttrType::Reference, 0),
    ];
    static ATTRS: StaticCapability = StaticCapability::new("Attrs", FIELDS, &[]);

    #[test]
    fn test_mixins_compose_without_conflicts() {
        let ty = compose(
            "Control",
            &[&ControlBase, &AnnotationMixin, &SeparatedControlMixin, &ATTRS],
        )
        .unwrap();
        let names: Vec<&str> = ty.surface().members.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            ["isControlTag", "controlId", "annotation", "states", "isSeparated", "obj"]
        );
    }

    #[test]
    fn test_mixin_views() {
        let ty = Arc::new(
            compose(
                "Control",
                &[&ControlBase, &AnnotationMixin, &SeparatedControlMixin, &ATTRS],
            )
            .unwrap(),
        );
        let raw: RawAttrs = [("name", "c1"), ("toName", "img")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut e = ty.instantiate(&raw, ValidationPolicy::Strict).unwrap();

        assert_eq!(e.view("isControlTag").unwrap(), Value::Bool(true));
        assert_eq!(e.view("controlId").unwrap(), json!(e.id()));
        assert_eq!(e.view("annotation").unwrap(), Value::Null);
        assert_eq!(e.view("obj").unwrap(), json!("img"));

        let ann = Annotation::new();
        e.bind_annotation(ann.clone()).unwrap();
        ann.attach_state("img", StateRef::new("lbl", "labels"));
        assert_eq!(e.view("annotation").unwrap(), json!(ann.id()));
        assert_eq!(e.view("states").unwrap(), json!(["lbl"]));
    }
}
