//! Annotation context shared by all entities of one document.
//!
//! Holds the states (classification/labeling tags) attached to each labeling
//! target, keyed by the target's name. Controls that point at the same target
//! via `toName` see the same states.
//!
//! Every effective change dispatches [`StatesChanged`] on the annotation's bus
//! after the state lock is released. Changes are queued for
//! [`Annotation::poll_changes`] only after [`Annotation::enable_change_queue`].

use log::debug;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, Weak};
use uuid::Uuid;

use crate::core::event_bus::{EventBus, downcast_event};

/// A state tag attached to a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateRef {
    /// Name of the state tag
    pub name: String,
    /// Tag type of the state (e.g. "labels")
    pub tag: String,
}

impl StateRef {
    pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
        }
    }
}

/// Emitted after states of `target` changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatesChanged {
    pub target: String,
    /// Number of states attached to `target` after the change
    pub count: usize,
}

#[derive(Debug)]
struct AnnotationInner {
    id: Uuid,
    states: RwLock<HashMap<String, Vec<StateRef>>>,
    bus: EventBus,
    queue_changes: AtomicBool,
}

/// Cheap-to-clone handle to one annotation.
#[derive(Debug, Clone)]
pub struct Annotation {
    inner: Arc<AnnotationInner>,
}

impl Default for Annotation {
    fn default() -> Self {
        Self::new()
    }
}

impl Annotation {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(AnnotationInner {
                id: Uuid::new_v4(),
                states: RwLock::new(HashMap::new()),
                bus: EventBus::new(),
                queue_changes: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Keep changes queued until [`poll_changes`](Self::poll_changes) drains them.
    pub fn enable_change_queue(&self) {
        self.inner.queue_changes.store(true, Ordering::SeqCst);
    }

    fn notify(&self, change: StatesChanged) {
        if self.inner.queue_changes.load(Ordering::SeqCst) {
            self.inner.bus.emit(change);
        } else {
            self.inner.bus.dispatch(&change);
        }
    }

    /// Non-owning handle, for callbacks stored on this annotation's own bus.
    pub fn downgrade(&self) -> WeakAnnotation {
        WeakAnnotation {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Attach a state to a target. Returns false if it was already attached.
    pub fn attach_state(&self, target: &str, state: StateRef) -> bool {
        let count = {
            let mut states = self.inner.states.write().unwrap_or_else(|e| e.into_inner());
            let list = states.entry(target.to_string()).or_default();
            if list.iter().any(|s| s.name == state.name) {
                return false;
            }
            debug!("Annotation {}: attach state `{}` to `{}`", self.inner.id, state.name, target);
            list.push(state);
            list.len()
        };
        self.notify(StatesChanged {
            target: target.to_string(),
            count,
        });
        true
    }

    /// Detach a state by name. Returns false if it was not attached.
    pub fn detach_state(&self, target: &str, state_name: &str) -> bool {
        let count = {
            let mut states = self.inner.states.write().unwrap_or_else(|e| e.into_inner());
            let Some(list) = states.get_mut(target) else {
                return false;
            };
            let before = list.len();
            list.retain(|s| s.name != state_name);
            if list.len() == before {
                return false;
            }
            debug!("Annotation {}: detach state `{}` from `{}`", self.inner.id, state_name, target);
            list.len()
        };
        self.notify(StatesChanged {
            target: target.to_string(),
            count,
        });
        true
    }

    /// States attached to a target, in attach order.
    pub fn states_for(&self, target: &str) -> Vec<StateRef> {
        self.inner
            .states
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(target)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_states(&self, target: &str) -> bool {
        self.inner
            .states
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(target)
            .is_some_and(|list| !list.is_empty())
    }

    /// Drain queued change notifications, oldest first. Empty unless
    /// [`enable_change_queue`](Self::enable_change_queue) was called.
    pub fn poll_changes(&self) -> Vec<StatesChanged> {
        self.inner
            .bus
            .poll()
            .iter()
            .filter_map(|ev| downcast_event::<StatesChanged>(ev).cloned())
            .collect()
    }
}

/// Weak counterpart of [`Annotation`].
#[derive(Debug, Clone)]
pub struct WeakAnnotation {
    inner: Weak<AnnotationInner>,
}

impl WeakAnnotation {
    pub fn upgrade(&self) -> Option<Annotation> {
        self.inner.upgrade().map(|inner| Annotation { inner })
    }
}
