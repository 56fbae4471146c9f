//! Entity - one live instance of a composed tag type.
//!
//! Construction is two-phase and host-driven:
//! 1. [`EntityType::instantiate`] validates markup attributes (`Constructed`)
//! 2. [`Entity::after_create`] runs the type's `afterCreate` action once,
//!    wiring tools (`Live`)
//!
//! An entity owns its tools exclusively; each tool refers back to the entity
//! by id. Entities belong to exactly one annotation.

use indexmap::IndexMap;
use log::{debug, trace};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use super::annotation::{Annotation, StateRef, StatesChanged};
use super::attrs::{AttrValue, Attrs};
use super::capability::{ActionContext, Behavior};
use super::composer::EntityType;
use super::keys::{A_NAME, A_TO_NAME, M_AFTER_CREATE};
use super::tools::Tool;
use crate::core::event_bus::SubscriptionId;
use crate::error::TagError;

/// Construction phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Fields validated, lifecycle hook not run yet
    Constructed,
    /// Lifecycle hook completed
    Live,
    /// Lifecycle hook failed; the entity must be discarded
    Failed,
}

#[derive(Debug)]
pub struct Entity {
    id: Uuid,
    kind: Arc<EntityType>,
    attrs: Attrs,
    annotation: Option<Annotation>,
    tools: IndexMap<&'static str, Tool>,
    phase: Phase,
}

/// Serializable view of an entity for reports.
#[derive(Debug, Serialize)]
pub struct EntitySnapshot<'a> {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub type_name: &'a str,
    pub phase: Phase,
    pub attrs: &'a Attrs,
    pub views: IndexMap<&'static str, Value>,
    pub tools: Vec<&'a Tool>,
}

impl Entity {
    pub(crate) fn construct(kind: Arc<EntityType>, attrs: Attrs) -> Self {
        let entity = Self {
            id: Uuid::new_v4(),
            kind,
            attrs,
            annotation: None,
            tools: IndexMap::new(),
            phase: Phase::Constructed,
        };
        trace!("Constructed {} {}", entity.kind.name(), entity.id);
        entity
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn entity_type(&self) -> &Arc<EntityType> {
        &self.kind
    }

    pub fn type_name(&self) -> &str {
        self.kind.name()
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn name(&self) -> Option<&str> {
        self.attrs.get_str(A_NAME)
    }

    /// Name of the labeling target, if set
    pub fn to_name(&self) -> Option<&str> {
        self.attrs.get_str(A_TO_NAME).filter(|s| !s.is_empty())
    }

    /// Name for diagnostics: the tag name, or the type name for unnamed tags
    pub fn label(&self) -> &str {
        self.name().unwrap_or_else(|| self.kind.name())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_live(&self) -> bool {
        self.phase == Phase::Live
    }

    // ========== Annotation context ==========

    /// Bind to an annotation. Rebinding to a different annotation is rejected.
    pub fn bind_annotation(&mut self, annotation: Annotation) -> Result<(), TagError> {
        if let Some(current) = &self.annotation {
            if current.id() != annotation.id() {
                return Err(TagError::invariant(
                    self.label(),
                    format!("already bound to annotation {}", current.id()),
                ));
            }
            return Ok(());
        }
        self.annotation = Some(annotation);
        Ok(())
    }

    pub fn annotation(&self) -> Option<&Annotation> {
        self.annotation.as_ref()
    }

    /// States attached to this entity's target.
    pub fn states(&self) -> Vec<StateRef> {
        match (&self.annotation, self.to_name()) {
            (Some(ann), Some(target)) => ann.states_for(target),
            _ => Vec::new(),
        }
    }

    /// Whether any state is attached to this entity's target. Recomputed on
    /// every call.
    pub fn has_states(&self) -> bool {
        match (&self.annotation, self.to_name()) {
            (Some(ann), Some(target)) => ann.has_states(target),
            _ => false,
        }
    }

    /// Call `callback` with the recomputed `has_states` value after every
    /// change to this entity's target. The returned id stops the watch via
    /// [`unwatch_has_states`](Self::unwatch_has_states).
    pub fn watch_has_states<F>(&self, callback: F) -> Result<SubscriptionId, TagError>
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let Some(annotation) = &self.annotation else {
            return Err(TagError::invariant(self.label(), "not bound to an annotation"));
        };
        let Some(target) = self.to_name().map(str::to_string) else {
            return Err(TagError::invariant(self.label(), "has no target to watch"));
        };
        let weak = annotation.downgrade();
        let id = annotation.bus().subscribe::<StatesChanged, _>(move |change| {
            if change.target == target {
                let has = weak.upgrade().is_some_and(|a| a.has_states(&target));
                callback(has);
            }
        });
        Ok(id)
    }

    /// Stop one watch. Returns false if it was not active.
    pub fn unwatch_has_states(&self, id: SubscriptionId) -> bool {
        self.annotation
            .as_ref()
            .is_some_and(|ann| ann.bus().unsubscribe(id))
    }

    // ========== Members ==========

    /// Evaluate a view member.
    pub fn view(&self, name: &str) -> Result<Value, TagError> {
        match self.kind.member(name).map(|m| m.member.behavior) {
            Some(Behavior::View(f)) => Ok(f(self)),
            _ => Err(TagError::UnknownMember {
                type_name: self.kind.name().to_string(),
                member: name.to_string(),
            }),
        }
    }

    /// Run an action member.
    pub fn call(&mut self, name: &str, ctx: &ActionContext<'_>) -> Result<(), TagError> {
        match self.kind.member(name).map(|m| m.member.behavior) {
            Some(Behavior::Action(f)) => f(self, ctx),
            _ => Err(TagError::UnknownMember {
                type_name: self.kind.name().to_string(),
                member: name.to_string(),
            }),
        }
    }

    /// Evaluate every view member, in surface order.
    pub fn views(&self) -> IndexMap<&'static str, Value> {
        self.kind
            .resolved_members()
            .filter_map(|m| match m.member.behavior {
                Behavior::View(f) => Some((m.member.name, f(self))),
                Behavior::Action(_) => None,
            })
            .collect()
    }

    // ========== Lifecycle ==========

    /// Phase two of construction: run the `afterCreate` hook exactly once.
    pub fn after_create(&mut self, ctx: &ActionContext<'_>) -> Result<(), TagError> {
        match self.phase {
            Phase::Live => {
                return Err(TagError::invariant(self.label(), "lifecycle hook already ran"));
            }
            Phase::Failed => {
                return Err(TagError::invariant(self.label(), "lifecycle hook failed earlier"));
            }
            Phase::Constructed => {}
        }

        for def in self.kind.schema().defs().iter().filter(|d| d.is_required()) {
            let set = match self.attrs.get(def.name) {
                Some(AttrValue::Str(s)) => !s.is_empty(),
                Some(_) => true,
                None => false,
            };
            if !set {
                self.phase = Phase::Failed;
                return Err(TagError::invariant(
                    self.label(),
                    format!("required field `{}` is not set", def.name),
                ));
            }
        }

        let hook = self.kind.member(M_AFTER_CREATE).map(|m| m.member.behavior);
        let result = match hook {
            Some(Behavior::Action(f)) => f(self, ctx),
            Some(Behavior::View(_)) => Err(TagError::invariant(
                self.label(),
                format!("`{}` must be an action", M_AFTER_CREATE),
            )),
            None => Ok(()),
        };

        match result {
            Ok(()) => {
                self.phase = Phase::Live;
                debug!("{} `{}` is live", self.kind.name(), self.label());
                Ok(())
            }
            Err(err) => {
                self.phase = Phase::Failed;
                Err(err)
            }
        }
    }

    // ========== Tools ==========

    /// Take ownership of a tool, link it back to this entity and store it
    /// under its kind's key. A second tool for the same key is rejected.
    pub fn attach_tool(&mut self, mut tool: Tool) -> Result<(), TagError> {
        let key = tool.kind().key();
        if self.tools.contains_key(key) {
            return Err(TagError::invariant(
                self.label(),
                format!("tool `{}` already attached", key),
            ));
        }
        tool.set_control(self.id);
        self.tools.insert(key, tool);
        Ok(())
    }

    pub fn tool(&self, key: &str) -> Option<&Tool> {
        self.tools.get(key)
    }

    pub fn tools(&self) -> impl Iterator<Item = &Tool> {
        self.tools.values()
    }

    /// Attributes flagged as style, for handing to tools.
    pub fn style(&self) -> Attrs {
        let keys = self
            .kind
            .schema()
            .defs()
            .iter()
            .filter(|d| d.is_style())
            .map(|d| d.name);
        self.attrs.subset(keys)
    }

    pub fn snapshot(&self) -> EntitySnapshot<'_> {
        EntitySnapshot {
            id: self.id,
            type_name: self.kind.name(),
            phase: self.phase,
            attrs: &self.attrs,
            views: self.views(),
            tools: self.tools.values().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::annotation::StateRef;
    use crate::entities::attrs::{
        AttrDef, AttrType, FLAG_REFERENCE, FLAG_REQUIRED, FLAG_STYLE, RawAttrs, ValidationPolicy,
    };
    use crate::entities::capability::{Member, StaticCapability};
    use crate::entities::composer::compose;
    use crate::entities::tools::{BuiltinTools, ToolConfig, ToolKind};
    use crate::entities::traits::ToolFactory;
    use serde_json::json;
    use std::sync::Mutex;

    const FIELDS: &[AttrDef] = &[
        AttrDef::new("name", AttrType::Identifier, FLAG_REQUIRED),
        AttrDef::new("toname", AttrType::Reference, FLAG_REFERENCE),
        AttrDef::with_default("strokecolor", AttrType::Color, FLAG_STYLE, "red"),
    ];

    fn hook(entity: &mut Entity, ctx: &ActionContext<'_>) -> Result<(), TagError> {
        let tool = ctx
            .tools
            .create_tool(ToolConfig::new(ToolKind::Ellipse).with_style(entity.style()));
        entity.attach_tool(tool)
    }

    fn kind_view(_: &Entity) -> Value {
        json!("shape")
    }

    static SHAPE: StaticCapability = StaticCapability::new(
        "Shape",
        FIELDS,
        &[Member::view("kind", kind_view), Member::action(M_AFTER_CREATE, hook)],
    );

    fn entity(pairs: &[(&str, &str)]) -> Entity {
        let ty = Arc::new(compose("ShapeModel", &[&SHAPE]).unwrap());
        let raw: RawAttrs = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ty.instantiate(&raw, ValidationPolicy::Strict).unwrap()
    }

    #[test]
    fn test_hook_runs_once() {
        let mut e = entity(&[("name", "s1")]);
        let ctx = ActionContext::new(&BuiltinTools);
        assert_eq!(e.phase(), Phase::Constructed);

        e.after_create(&ctx).unwrap();
        assert!(e.is_live());
        assert_eq!(e.tools().count(), 1);

        let err = e.after_create(&ctx).unwrap_err();
        assert!(matches!(err, TagError::InvariantViolation { .. }));
        // No second tool was created
        assert_eq!(e.tools().count(), 1);
    }

    #[test]
    fn test_tool_back_reference() {
        let mut e = entity(&[("name", "s1")]);
        e.after_create(&ActionContext::new(&BuiltinTools)).unwrap();

        let tool = e.tool("ellipse").unwrap();
        assert_eq!(tool.control(), Some(e.id()));
        assert_eq!(tool.active_shape(), None);
        assert_eq!(tool.style().get_str("strokecolor"), Some("red"));
    }

    #[test]
    fn test_second_tool_same_key_rejected() {
        let mut e = entity(&[("name", "s1")]);
        e.after_create(&ActionContext::new(&BuiltinTools)).unwrap();
        let extra = BuiltinTools.create_tool(ToolConfig::new(ToolKind::Ellipse));
        assert!(matches!(e.attach_tool(extra), Err(TagError::InvariantViolation { .. })));
    }

    #[test]
    fn test_hook_requires_fields() {
        let ty = Arc::new(compose("ShapeModel", &[&SHAPE]).unwrap());
        let mut e = Entity::construct(ty, Attrs::new());
        let err = e.after_create(&ActionContext::new(&BuiltinTools)).unwrap_err();
        assert!(err.to_string().contains("`name`"));
        assert_eq!(e.phase(), Phase::Failed);
        assert!(e.after_create(&ActionContext::new(&BuiltinTools)).is_err());
    }

    #[test]
    fn test_views_and_actions_by_name() {
        let mut e = entity(&[("name", "s1")]);
        assert_eq!(e.view("kind").unwrap(), json!("shape"));
        assert!(matches!(e.view(M_AFTER_CREATE), Err(TagError::UnknownMember { .. })));
        assert!(matches!(e.view("missing"), Err(TagError::UnknownMember { .. })));

        let ctx = ActionContext::new(&BuiltinTools);
        assert!(e.call("kind", &ctx).is_err());
        let views = e.views();
        assert_eq!(views.keys().copied().collect::<Vec<_>>(), ["kind"]);
    }

    #[test]
    fn test_has_states_tracks_target() {
        let mut e = entity(&[("name", "s1"), ("toName", "img")]);
        assert!(!e.has_states());

        let ann = Annotation::new();
        e.bind_annotation(ann.clone()).unwrap();
        assert!(!e.has_states());

        ann.attach_state("other", StateRef::new("x", "labels"));
        assert!(!e.has_states());
        ann.attach_state("img", StateRef::new("lbl", "labels"));
        assert!(e.has_states());
        assert_eq!(e.states(), vec![StateRef::new("lbl", "labels")]);
    }

    #[test]
    fn test_watch_has_states() {
        let mut e = entity(&[("name", "s1"), ("toName", "img")]);
        assert!(e.watch_has_states(|_| {}).is_err());

        let ann = Annotation::new();
        e.bind_annotation(ann.clone()).unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        e.watch_has_states(move |has| s.lock().unwrap().push(has)).unwrap();

        ann.attach_state("other", StateRef::new("x", "labels"));
        ann.attach_state("img", StateRef::new("lbl", "labels"));
        ann.detach_state("img", "lbl");
        assert_eq!(*seen.lock().unwrap(), [true, false]);
    }

    #[test]
    fn test_unwatch_one_of_two() {
        let mut e = entity(&[("name", "s1"), ("toName", "img")]);
        let ann = Annotation::new();
        e.bind_annotation(ann.clone()).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s1 = Arc::clone(&seen);
        let first = e.watch_has_states(move |has| s1.lock().unwrap().push(("first", has))).unwrap();
        let s2 = Arc::clone(&seen);
        e.watch_has_states(move |has| s2.lock().unwrap().push(("second", has))).unwrap();

        assert!(e.unwatch_has_states(first));
        assert!(!e.unwatch_has_states(first));
        ann.attach_state("img", StateRef::new("lbl", "labels"));
        assert_eq!(*seen.lock().unwrap(), [("second", true)]);
    }

    #[test]
    fn test_rebinding_other_annotation_rejected() {
        let mut e = entity(&[("name", "s1")]);
        let ann = Annotation::new();
        e.bind_annotation(ann.clone()).unwrap();
        e.bind_annotation(ann).unwrap();
        assert!(e.bind_annotation(Annotation::new()).is_err());
    }
}
