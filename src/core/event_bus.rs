//! Pub/Sub event bus for change notification.
//!
//! Architecture:
//! - Dependents subscribe to an event type with a callback
//! - emit() invokes callbacks immediately AND queues the event
//! - dispatch() invokes callbacks only, for emitters nobody polls
//! - poll() drains the queue for hosts that batch notifications per cycle
//! - subscribe() returns a [`SubscriptionId`] for unsubscribe()
//!
//! Callback order: FIFO (first-subscribed, first-called) within same event type.
//! Cross-type order undefined.
//!
//! Callbacks run synchronously inside emit()/dispatch(); emitters must release their own
//! locks before emitting so callbacks can read fresh state.

use log::warn;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Maximum events in queue before oldest are evicted
const MAX_QUEUE_SIZE: usize = 1000;

/// Marker trait for events. Events must be Send + Sync + 'static.
pub trait Event: Any + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

// Blanket impl for all qualifying types
impl<T: Any + Send + Sync + 'static> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Type-erased callback
type Callback = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Boxed event for queue storage
pub type BoxedEvent = Box<dyn Event>;

/// Handle to one subscription, unique per bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Pub/Sub event bus. Cloning shares subscribers and queue.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<RwLock<HashMap<TypeId, Vec<(SubscriptionId, Callback)>>>>,
    queue: Arc<Mutex<Vec<BoxedEvent>>>,
    next_id: Arc<AtomicU64>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_types", &self.subscribers.read().map(|s| s.len()).unwrap_or(0))
            .field("queue_len", &self.queue.lock().map(|q| q.len()).unwrap_or(0))
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            queue: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Subscribe to events of type E. Callback runs inside emit()/dispatch().
    pub fn subscribe<E, F>(&self, callback: F) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let type_id = TypeId::of::<E>();
        let wrapped: Callback = Arc::new(move |any: &dyn Any| {
            if let Some(event) = any.downcast_ref::<E>() {
                callback(event);
            }
        });
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(type_id)
            .or_default()
            .push((id, wrapped));
        id
    }

    /// Remove one subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        for list in subscribers.values_mut() {
            if let Some(pos) = list.iter().position(|(sid, _)| *sid == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Invoke callbacks for `event` without queueing it.
    pub fn dispatch<E: Event>(&self, event: &E) {
        // Clone the callback list so callbacks may (un)subscribe without deadlocking
        let callbacks: Vec<Callback> = self
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&TypeId::of::<E>())
            .map(|list| list.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default();
        for cb in &callbacks {
            cb(event);
        }
    }

    /// Emit event: invoke callbacks immediately AND queue for poll().
    pub fn emit<E: Event + Clone>(&self, event: E) {
        self.dispatch(&event);

        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        if queue.len() >= MAX_QUEUE_SIZE {
            let evict_count = queue.len() / 2;
            warn!("EventBus queue full ({} events), evicting oldest {}", queue.len(), evict_count);
            queue.drain(0..evict_count);
        }
        queue.push(Box::new(event));
    }

    /// Drain all queued events.
    pub fn poll(&self) -> Vec<BoxedEvent> {
        std::mem::take(&mut *self.queue.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Clear subscribers for type E
    pub fn unsubscribe_all<E: Event>(&self) {
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&TypeId::of::<E>());
    }

    /// Clear all subscribers and queue
    pub fn clear(&self) {
        self.subscribers.write().unwrap_or_else(|e| e.into_inner()).clear();
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Check if there are subscribers for event type E
    pub fn has_subscribers<E: Event>(&self) -> bool {
        self.subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&TypeId::of::<E>())
            .map(|v| !v.is_empty())
            .unwrap_or(false)
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Helper: downcast BoxedEvent to concrete type
///
/// Must deref to `dyn Event` before `as_any()`: the blanket impl also covers
/// `Box<dyn Event>` itself, whose `as_any()` would yield the box.
#[inline]
pub fn downcast_event<E: Event>(event: &BoxedEvent) -> Option<&E> {
    (**event).as_any().downcast_ref::<E>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Debug)]
    struct Attached {
        count: usize,
    }

    #[derive(Clone, Debug)]
    struct Detached;

    #[test]
    fn test_subscribe_emit_immediate() {
        let bus = EventBus::new();
        let total = Arc::new(AtomicUsize::new(0));
        let t = Arc::clone(&total);

        bus.subscribe::<Attached, _>(move |e| {
            t.fetch_add(e.count, Ordering::SeqCst);
        });

        bus.emit(Attached { count: 2 });
        assert_eq!(total.load(Ordering::SeqCst), 2);

        bus.emit(Attached { count: 3 });
        assert_eq!(total.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_emit_queues_for_poll() {
        let bus = EventBus::new();

        bus.emit(Attached { count: 1 });
        bus.emit(Detached);
        assert_eq!(bus.queue_len(), 2);

        let events = bus.poll();
        assert_eq!(events.len(), 2);
        assert_eq!(downcast_event::<Attached>(&events[0]).map(|e| e.count), Some(1));
        assert!(downcast_event::<Detached>(&events[1]).is_some());
        assert!(downcast_event::<Attached>(&events[1]).is_none());

        assert_eq!(bus.poll().len(), 0);
    }

    #[test]
    fn test_subscribers_fifo_and_typed() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o1 = Arc::clone(&order);
        bus.subscribe::<Attached, _>(move |_| o1.lock().unwrap().push("first"));
        let o2 = Arc::clone(&order);
        bus.subscribe::<Attached, _>(move |_| o2.lock().unwrap().push("second"));
        let o3 = Arc::clone(&order);
        bus.subscribe::<Detached, _>(move |_| o3.lock().unwrap().push("detached"));

        bus.emit(Attached { count: 1 });
        assert_eq!(*order.lock().unwrap(), ["first", "second"]);
    }

    #[test]
    fn test_unsubscribe_and_clear() {
        let bus = EventBus::new();
        let total = Arc::new(AtomicUsize::new(0));
        let t = Arc::clone(&total);
        bus.subscribe::<Attached, _>(move |e| {
            t.fetch_add(e.count, Ordering::SeqCst);
        });
        assert!(bus.has_subscribers::<Attached>());
        assert!(!bus.has_subscribers::<Detached>());

        bus.unsubscribe_all::<Attached>();
        bus.emit(Attached { count: 10 });
        assert_eq!(total.load(Ordering::SeqCst), 0);
        // Still queued
        assert_eq!(bus.queue_len(), 1);

        bus.clear();
        assert_eq!(bus.queue_len(), 0);
    }

    #[test]
    fn test_unsubscribe_one() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o1 = Arc::clone(&order);
        let first = bus.subscribe::<Attached, _>(move |_| o1.lock().unwrap().push("first"));
        let o2 = Arc::clone(&order);
        let second = bus.subscribe::<Attached, _>(move |_| o2.lock().unwrap().push("second"));
        assert_ne!(first, second);

        assert!(bus.unsubscribe(first));
        assert!(!bus.unsubscribe(first));
        bus.emit(Attached { count: 1 });
        assert_eq!(*order.lock().unwrap(), ["second"]);

        assert!(bus.unsubscribe(second));
        assert!(!bus.has_subscribers::<Attached>());
    }

    #[test]
    fn test_dispatch_does_not_queue() {
        let bus = EventBus::new();
        let total = Arc::new(AtomicUsize::new(0));
        let t = Arc::clone(&total);
        bus.subscribe::<Attached, _>(move |e| {
            t.fetch_add(e.count, Ordering::SeqCst);
        });

        for _ in 0..(MAX_QUEUE_SIZE + 1) {
            bus.dispatch(&Attached { count: 1 });
        }
        assert_eq!(total.load(Ordering::SeqCst), MAX_QUEUE_SIZE + 1);
        assert_eq!(bus.queue_len(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let bus = EventBus::new();
        let handle = bus.clone();
        let total = Arc::new(AtomicUsize::new(0));
        let t = Arc::clone(&total);
        bus.subscribe::<Attached, _>(move |e| {
            t.fetch_add(e.count, Ordering::SeqCst);
        });

        handle.emit(Attached { count: 4 });
        assert_eq!(total.load(Ordering::SeqCst), 4);
        assert_eq!(bus.poll().len(), 1);
    }
}
