//! Dependency Nodes
//!
//! A [`Dep`] is the meeting point between a piece of tracked data and the
//! consumers that read it. Reading data calls [`Dep::depend`], which hands
//! the node to the active consumer; writing data calls [`Dep::notify`],
//! which calls `update()` on every subscriber.
//!
//! # Notification
//!
//! `notify` works on a snapshot of the subscriber list taken at call time.
//! A consumer that unsubscribes itself (or subscribes somebody new) while
//! being updated therefore cannot corrupt the pass; new subscriptions take
//! effect from the next `notify`.
//!
//! Subscribers are held strongly. Dropping a consumer's handle does not
//! unsubscribe it; only [`Dep::remove_subscriber`] (or disposing the
//! consumer) does.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::trace;

use super::context::ReactiveContext;
use super::Consumer;
use crate::config;

/// Counter for generating unique dependency ids.
static DEP_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for a dependency node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DepId(u64);

impl DepId {
    fn next() -> Self {
        Self(DEP_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

type SubscriberList = SmallVec<[Arc<dyn Consumer>; 4]>;

struct DepInner {
    id: DepId,
    subscribers: Mutex<SubscriberList>,
}

/// A dependency node. Cloning yields another handle to the same node.
#[derive(Clone)]
pub struct Dep {
    inner: Arc<DepInner>,
}

impl Dep {
    /// Create a node with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DepInner {
                id: DepId::next(),
                subscribers: Mutex::new(SmallVec::new()),
            }),
        }
    }

    /// Get the node's unique ID.
    pub fn id(&self) -> DepId {
        self.inner.id
    }

    /// Append a subscriber. Duplicates are allowed.
    pub fn add_subscriber(&self, consumer: &Arc<dyn Consumer>) {
        self.inner.subscribers.lock().push(consumer.clone());
        trace!(dep = self.inner.id.0, subscriber = consumer.id().raw(), "subscribed");
    }

    /// Remove the first entry for `consumer`. No-op if absent.
    pub fn remove_subscriber(&self, consumer: &Arc<dyn Consumer>) {
        let mut subscribers = self.inner.subscribers.lock();
        if let Some(pos) = subscribers.iter().position(|s| Arc::ptr_eq(s, consumer)) {
            subscribers.remove(pos);
        }
    }

    /// Subscribe the active consumer, if there is one.
    pub fn depend(&self) {
        if let Some(consumer) = ReactiveContext::current() {
            consumer.add_dep(self);
        }
    }

    /// Call `update()` on every current subscriber.
    ///
    /// With synchronous dispatch (`async_updates` off) subscribers run in
    /// ascending id order; otherwise ordering is left to the scheduler.
    pub fn notify(&self) {
        let mut snapshot: Vec<Arc<dyn Consumer>> =
            self.inner.subscribers.lock().iter().cloned().collect();

        if !config::async_updates() {
            snapshot.sort_by_key(|c| c.id());
        }

        trace!(dep = self.inner.id.0, subscribers = snapshot.len(), "notify");

        for consumer in snapshot {
            consumer.update();
        }
    }

    /// Number of subscriber entries, duplicates included.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Whether `consumer` is currently subscribed.
    pub fn has_subscriber(&self, consumer: &Arc<dyn Consumer>) -> bool {
        self.inner
            .subscribers
            .lock()
            .iter()
            .any(|s| Arc::ptr_eq(s, consumer))
    }

    /// Whether two handles refer to the same node.
    pub fn ptr_eq(&self, other: &Dep) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep")
            .field("id", &self.inner.id)
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
