//! Tag registry: tag name → (entity type, render function).
//!
//! Lifecycle:
//! - startup: each tag module calls `register` once
//! - the first document parse seals the registry; later `register` calls fail
//! - `register` and `seal` serialize on the entry lock, so no entry lands
//!   after `seal` returns
//! - `resolve` is a pure lookup, safe from any thread at any time
//!
//! Tag names are case-insensitive and stored lower-case.

use indexmap::IndexMap;
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, RwLock};

use crate::entities::composer::EntityType;
use crate::entities::entity::Entity;
use crate::entities::view::ViewNode;
use crate::error::TagError;

/// Render contract: a live entity to its own view node, or None if the tag
/// draws nothing itself.
pub type RenderFn = fn(&Entity) -> Option<ViewNode>;

/// Registry entry.
#[derive(Clone)]
pub struct TagEntry {
    pub entity_type: Arc<EntityType>,
    pub render: RenderFn,
}

impl std::fmt::Debug for TagEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagEntry")
            .field("entity_type", &self.entity_type.name())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct TagRegistry {
    entries: RwLock<IndexMap<String, TagEntry>>,
    sealed: AtomicBool,
}

static TAG_REGISTRY: LazyLock<TagRegistry> = LazyLock::new(TagRegistry::new);

/// Process-wide registry.
pub fn registry() -> &'static TagRegistry {
    &TAG_REGISTRY
}

impl TagRegistry {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(IndexMap::new()),
            sealed: AtomicBool::new(false),
        }
    }

    /// Register a tag. Fails if the name is taken or the registry is sealed.
    pub fn register(
        &self,
        tag: &str,
        entity_type: Arc<EntityType>,
        render: RenderFn,
    ) -> Result<(), TagError> {
        let key = tag.to_ascii_lowercase();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if self.is_sealed() {
            return Err(TagError::RegistryClosed(key));
        }
        if entries.contains_key(&key) {
            return Err(TagError::DuplicateTag(key));
        }
        debug!("Registered tag <{}> as {}", key, entity_type.name());
        entries.insert(key, TagEntry { entity_type, render });
        Ok(())
    }

    /// Look up a tag by name.
    pub fn resolve(&self, tag: &str) -> Result<TagEntry, TagError> {
        let key = tag.to_ascii_lowercase();
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
            .cloned()
            .ok_or(TagError::NotFound(key))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&tag.to_ascii_lowercase())
    }

    /// Registered tag names, in registration order.
    pub fn tags(&self) -> Vec<String> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close registration. Idempotent.
    pub fn seal(&self) {
        let entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if !self.sealed.swap(true, Ordering::SeqCst) {
            info!("Tag registry sealed with {} tags", entries.len());
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }

    /// Drop all entries and reopen registration.
    #[cfg(any(test, feature = "test_utils"))]
    pub fn reset(&self) {
        self.entries.write().unwrap_or_else(|e| e.into_inner()).clear();
        self.sealed.store(false, Ordering::SeqCst);
    }
}
