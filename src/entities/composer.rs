//! Entity composer: merges capability bundles into one concrete entity type.
//!
//! Merge rules, applied in bundle order:
//! - fields are a disjoint union; any repeated field name is rejected
//! - a member may not share a name with a field
//! - a member redefined with the same kind overrides the earlier one (last wins)
//! - a member redefined with a different kind (view vs action) is rejected
//! - every declared default must coerce against its own field type
//!
//! All checks run here, at type-definition time. Composition has no side
//! effects; entities are only created by [`EntityType::instantiate`].

use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use super::attrs::{AttrDef, AttrSchema, AttrType, RawAttrs, ValidationPolicy};
use super::capability::{Capability, Member, MemberKind};
use super::entity::Entity;
use crate::error::TagError;

/// A member after merging, with provenance.
#[derive(Debug, Clone)]
pub struct ResolvedMember {
    pub member: Member,
    /// Bundle that supplied the winning definition
    pub origin: String,
    /// Bundles whose definitions were overridden, oldest first
    pub overrides: Vec<String>,
}

/// Instance surface of a composed type: what an entity exposes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Surface {
    pub fields: Vec<(&'static str, AttrType)>,
    pub members: Vec<(&'static str, MemberKind)>,
}

/// Concrete, instantiable entity type.
#[derive(Debug, Clone)]
pub struct EntityType {
    name: String,
    bundles: Vec<String>,
    schema: AttrSchema,
    members: IndexMap<&'static str, ResolvedMember>,
    member_table: Vec<Member>,
}

/// Compose `bundles` (in order) into a type named `name`.
pub fn compose(name: &str, bundles: &[&dyn Capability]) -> Result<EntityType, TagError> {
    if name.trim().is_empty() {
        return Err(TagError::composition(name, "type name is empty"));
    }
    if bundles.is_empty() {
        return Err(TagError::composition(name, "no capability bundles given"));
    }

    let mut fields: IndexMap<&'static str, (AttrDef, String)> = IndexMap::new();
    let mut members: IndexMap<&'static str, ResolvedMember> = IndexMap::new();
    let mut bundle_names = Vec::with_capacity(bundles.len());

    for bundle in bundles {
        let bname = bundle.name().to_string();
        let mut local: HashSet<&'static str> = HashSet::new();

        for def in bundle.fields() {
            if !local.insert(def.name) {
                return Err(TagError::composition(
                    name,
                    format!("`{}` declares `{}` twice", bname, def.name),
                ));
            }
            if let Some((_, owner)) = fields.get(def.name) {
                return Err(TagError::composition(
                    name,
                    format!("field `{}` is declared by both `{}` and `{}`", def.name, owner, bname),
                ));
            }
            if let Some(existing) = members.get(def.name) {
                return Err(TagError::composition(
                    name,
                    format!(
                        "field `{}` of `{}` collides with a member of `{}`",
                        def.name, bname, existing.origin
                    ),
                ));
            }
            if let Some(Err(err)) = def.default_value() {
                return Err(TagError::composition(
                    name,
                    format!("default of field `{}` in `{}` is invalid: {}", def.name, bname, err),
                ));
            }
            fields.insert(def.name, (*def, bname.clone()));
        }

        for member in bundle.members() {
            if !local.insert(member.name) {
                return Err(TagError::composition(
                    name,
                    format!("`{}` declares `{}` twice", bname, member.name),
                ));
            }
            if let Some((_, owner)) = fields.get(member.name) {
                return Err(TagError::composition(
                    name,
                    format!(
                        "member `{}` of `{}` collides with a field of `{}`",
                        member.name, bname, owner
                    ),
                ));
            }
            match members.get_mut(member.name) {
                Some(existing) if existing.member.kind() != member.kind() => {
                    return Err(TagError::composition(
                        name,
                        format!(
                            "`{}` is a {:?} in `{}` but a {:?} in `{}`",
                            member.name,
                            existing.member.kind(),
                            existing.origin,
                            member.kind(),
                            bname
                        ),
                    ));
                }
                Some(existing) => {
                    debug!(
                        "{}: `{}` from `{}` overrides `{}`",
                        name, member.name, bname, existing.origin
                    );
                    let previous = std::mem::replace(&mut existing.origin, bname.clone());
                    existing.overrides.push(previous);
                    existing.member = *member;
                }
                None => {
                    members.insert(
                        member.name,
                        ResolvedMember {
                            member: *member,
                            origin: bname.clone(),
                            overrides: Vec::new(),
                        },
                    );
                }
            }
        }

        bundle_names.push(bname);
    }

    let defs: Vec<AttrDef> = fields.into_values().map(|(def, _)| def).collect();
    let member_table = members.values().map(|m| m.member).collect();
    debug!(
        "Composed {} from [{}]: {} fields, {} members",
        name,
        bundle_names.join(", "),
        defs.len(),
        members.len()
    );

    Ok(EntityType {
        name: name.to_string(),
        bundles: bundle_names,
        schema: AttrSchema::from_defs(name, defs),
        members,
        member_table,
    })
}

impl EntityType {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the composed bundles, in merge order.
    pub fn bundles(&self) -> &[String] {
        &self.bundles
    }

    /// Whether a bundle with this name took part in composition
    pub fn has_capability(&self, bundle: &str) -> bool {
        self.bundles.iter().any(|b| b == bundle)
    }

    pub fn schema(&self) -> &AttrSchema {
        &self.schema
    }

    pub fn member(&self, name: &str) -> Option<&ResolvedMember> {
        self.members.get(name)
    }

    pub fn resolved_members(&self) -> impl Iterator<Item = &ResolvedMember> {
        self.members.values()
    }

    pub fn surface(&self) -> Surface {
        Surface {
            fields: self.schema.defs().iter().map(|d| (d.name, d.attr_type)).collect(),
            members: self.members.values().map(|m| (m.member.name, m.member.kind())).collect(),
        }
    }

    /// Phase one of construction: validate markup attributes into a new entity.
    ///
    /// The entity is not live until [`Entity::after_create`] has run.
    pub fn instantiate(
        self: &Arc<Self>,
        raw: &RawAttrs,
        policy: ValidationPolicy,
    ) -> Result<Entity, TagError> {
        let attrs = self.schema.validate(raw, policy)?;
        Ok(Entity::construct(Arc::clone(self), attrs))
    }
}

impl Capability for EntityType {
    fn name(&self) -> &str {
        &self.name
    }

    fn fields(&self) -> &[AttrDef] {
        self.schema.defs()
    }

    fn members(&self) -> &[Member] {
        &self.member_table
    }
}
