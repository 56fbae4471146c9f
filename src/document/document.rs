//! Document - a parsed labeling config with live entities.
//!
//! Parsing runs in fixed stages; any failure discards the whole document:
//! 1. read markup into a node tree, at most [`markup::MAX_DEPTH`] levels deep
//! 2. resolve every tag through the registry, validate its attributes and
//!    bind the entity to the document's annotation
//! 3. check that names are unique and every reference field resolves
//! 4. run lifecycle hooks in document order
//!
//! Parsing seals the registry it reads from.

use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use super::markup::{self, MarkupNode};
use crate::core::registry::{RenderFn, TagRegistry};
use crate::entities::annotation::Annotation;
use crate::entities::attrs::ValidationPolicy;
use crate::entities::capability::ActionContext;
use crate::entities::entity::{Entity, EntitySnapshot};
use crate::entities::tools::BuiltinTools;
use crate::entities::traits::ToolFactory;
use crate::entities::view::ViewNode;
use crate::error::{DocumentError, TagError};

struct Slot {
    tag: String,
    entity: Entity,
    render: RenderFn,
    children: Vec<usize>,
}

pub struct Document {
    annotation: Annotation,
    /// Entities in document (pre-)order
    slots: Vec<Slot>,
    roots: Vec<usize>,
    by_name: HashMap<String, usize>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("annotation", &self.annotation.id())
            .field("entities", &self.slots.iter().map(|s| s.entity.label()).collect::<Vec<_>>())
            .finish()
    }
}

/// Serializable report of a parsed document.
#[derive(Debug, Serialize)]
pub struct DocumentSnapshot<'a> {
    pub annotation: Uuid,
    pub entities: Vec<EntitySnapshot<'a>>,
}

impl Document {
    /// Parse with the built-in tools subsystem.
    pub fn parse(
        src: &str,
        registry: &TagRegistry,
        policy: ValidationPolicy,
    ) -> Result<Self, DocumentError> {
        Self::parse_with_tools(src, registry, policy, &BuiltinTools)
    }

    pub fn parse_with_tools(
        src: &str,
        registry: &TagRegistry,
        policy: ValidationPolicy,
        tools: &dyn ToolFactory,
    ) -> Result<Self, DocumentError> {
        let nodes = markup::parse(src)?;
        registry.seal();

        let annotation = Annotation::new();
        let mut doc = Self {
            annotation,
            slots: Vec::new(),
            roots: Vec::new(),
            by_name: HashMap::new(),
        };
        for node in &nodes {
            let idx = doc.instantiate(node, registry, policy)?;
            doc.roots.push(idx);
        }

        doc.check_references()?;

        let ctx = ActionContext::new(tools);
        for slot in &mut doc.slots {
            slot.entity
                .after_create(&ctx)
                .map_err(|e| DocumentError::tag(&slot.tag, e))?;
        }

        info!(
            "Parsed document: {} entities, annotation {}",
            doc.slots.len(),
            doc.annotation.id()
        );
        Ok(doc)
    }

    fn instantiate(
        &mut self,
        node: &MarkupNode,
        registry: &TagRegistry,
        policy: ValidationPolicy,
    ) -> Result<usize, DocumentError> {
        let entry = registry.resolve(&node.tag).map_err(|e| match e {
            TagError::NotFound(tag) => DocumentError::UnresolvedTag(tag),
            other => DocumentError::tag(&node.tag, other),
        })?;
        let mut entity = entry
            .entity_type
            .instantiate(&node.attrs, policy)
            .map_err(|e| DocumentError::tag(&node.tag, e))?;
        entity
            .bind_annotation(self.annotation.clone())
            .map_err(|e| DocumentError::tag(&node.tag, e))?;

        let idx = self.slots.len();
        if let Some(name) = entity.name() {
            if self.by_name.insert(name.to_string(), idx).is_some() {
                return Err(DocumentError::DuplicateName(name.to_string()));
            }
        }
        debug!("<{}> -> {} #{}", node.tag, entity.type_name(), idx);
        self.slots.push(Slot {
            tag: node.tag.clone(),
            entity,
            render: entry.render,
            children: Vec::new(),
        });

        for child in &node.children {
            let child_idx = self.instantiate(child, registry, policy)?;
            self.slots[idx].children.push(child_idx);
        }
        Ok(idx)
    }

    fn check_references(&self) -> Result<(), DocumentError> {
        for slot in &self.slots {
            let entity = &slot.entity;
            for def in entity.entity_type().schema().defs().iter().filter(|d| d.is_reference()) {
                let Some(target) = entity.attrs().get_str(def.name).filter(|s| !s.is_empty())
                else {
                    continue;
                };
                if !self.by_name.contains_key(target) {
                    return Err(DocumentError::UnresolvedReference {
                        from: entity.label().to_string(),
                        field: def.name.to_string(),
                        to: target.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All entities in document order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.slots.iter().map(|s| &s.entity)
    }

    /// Entity by its `name` attribute.
    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.by_name.get(name).map(|&i| &self.slots[i].entity)
    }

    /// The entity `entity` points at through `toName`.
    pub fn resolve_target(&self, entity: &Entity) -> Option<&Entity> {
        entity.to_name().and_then(|t| self.get(t))
    }

    /// Build the view tree. Children of a tag that renders nothing are
    /// lifted into its parent.
    pub fn render(&self) -> Vec<ViewNode> {
        let mut out = Vec::new();
        for &idx in &self.roots {
            self.render_into(idx, &mut out);
        }
        out
    }

    fn render_into(&self, idx: usize, out: &mut Vec<ViewNode>) {
        let slot = &self.slots[idx];
        match (slot.render)(&slot.entity) {
            Some(mut node) => {
                for &child in &slot.children {
                    self.render_into(child, &mut node.children);
                }
                out.push(node);
            }
            None => {
                for &child in &slot.children {
                    self.render_into(child, out);
                }
            }
        }
    }

    pub fn snapshot(&self) -> DocumentSnapshot<'_> {
        DocumentSnapshot {
            annotation: self.annotation.id(),
            entities: self.entities().map(Entity::snapshot).collect(),
        }
    }
}
