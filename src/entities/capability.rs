//! Capability bundles: the unit of tag composition.
//!
//! A capability contributes attribute fields and named members. Members are
//! plain function pointers, so a bundle is inert data until the composed type
//! is instantiated:
//! - views: `fn(&Entity) -> Value`, read-only and side-effect free
//! - actions: `fn(&mut Entity, &ActionContext) -> Result<()>`
//!
//! [`EntityType`](super::composer::EntityType) implements [`Capability`] too,
//! which makes composition associative.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use super::attrs::AttrDef;
use super::entity::Entity;
use super::traits::ToolFactory;
use crate::error::TagError;

pub type ViewFn = fn(&Entity) -> Value;
pub type ActionFn = fn(&mut Entity, &ActionContext<'_>) -> Result<(), TagError>;

/// Host resources handed to actions.
pub struct ActionContext<'a> {
    /// Tools subsystem used by lifecycle hooks
    pub tools: &'a dyn ToolFactory,
}

impl<'a> ActionContext<'a> {
    pub fn new(tools: &'a dyn ToolFactory) -> Self {
        Self { tools }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    View,
    Action,
}

#[derive(Clone, Copy)]
pub enum Behavior {
    View(ViewFn),
    Action(ActionFn),
}

impl Behavior {
    pub fn kind(&self) -> MemberKind {
        match self {
            Behavior::View(_) => MemberKind::View,
            Behavior::Action(_) => MemberKind::Action,
        }
    }
}

/// Named behavior contributed by a capability.
#[derive(Clone, Copy)]
pub struct Member {
    pub name: &'static str,
    pub behavior: Behavior,
}

impl Member {
    pub const fn view(name: &'static str, f: ViewFn) -> Self {
        Self {
            name,
            behavior: Behavior::View(f),
        }
    }

    pub const fn action(name: &'static str, f: ActionFn) -> Self {
        Self {
            name,
            behavior: Behavior::Action(f),
        }
    }

    pub fn kind(&self) -> MemberKind {
        self.behavior.kind()
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish()
    }
}

/// A composable bundle of fields and members.
pub trait Capability: Send + Sync {
    /// Bundle name, used in composition diagnostics
    fn name(&self) -> &str;

    /// Attribute fields this bundle declares
    fn fields(&self) -> &[AttrDef] {
        &[]
    }

    /// Views and actions this bundle declares
    fn members(&self) -> &[Member] {
        &[]
    }
}

/// Capability assembled from static tables. Used for tag-specific bundles.
#[derive(Debug, Clone, Copy)]
pub struct StaticCapability {
    pub name: &'static str,
    pub fields: &'static [AttrDef],
    pub members: &'static [Member],
}

impl StaticCapability {
    pub const fn new(
        name: &'static str,
        fields: &'static [AttrDef],
        members: &'static [Member],
    ) -> Self {
        Self {
            name,
            fields,
            members,
        }
    }
}

impl Capability for StaticCapability {
    fn name(&self) -> &str {
        self.name
    }

    fn fields(&self) -> &[AttrDef] {
        self.fields
    }

    fn members(&self) -> &[Member] {
        self.members
    }
}
