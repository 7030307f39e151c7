//! Subscriber types for the reactive system.
//!
//! A consumer is any computation that can subscribe to dependency nodes and
//! be re-invoked when one of them notifies. Effects, computed values and
//! render functions are all consumers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::Dep;

/// Unique identifier for a subscriber.
///
/// Ids are assigned monotonically at creation. Notification order and
/// scheduler order both rely on this: a consumer created earlier (usually an
/// ancestor computation) has a smaller id and runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The capability the engine calls into.
///
/// Both hooks take `Arc<Self>` so an implementation can hand itself to
/// [`Dep::add_subscriber`] or to the scheduler.
pub trait Consumer: Send + Sync {
    /// Stable, creation-ordered id.
    fn id(&self) -> SubscriberId;

    /// Called when this consumer is active and reads a tracked value.
    ///
    /// Deduplication, if wanted, is the consumer's job.
    fn add_dep(self: Arc<Self>, dep: &Dep);

    /// Called when a dependency this consumer is subscribed to notifies.
    fn update(self: Arc<Self>);
}

/// A minimal consumer backed by a callback.
///
/// Subscribes on every read without deduplication and invokes its callback
/// on every notification.
pub struct Subscriber {
    id: SubscriberId,
    /// The callback to invoke when dependencies change.
    notify: Box<dyn Fn() + Send + Sync>,
}

impl Subscriber {
    /// Create a new subscriber with the given notification callback.
    pub fn new<F>(notify: F) -> Arc<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        Arc::new(Self {
            id: SubscriberId::new(),
            notify: Box::new(notify),
        })
    }

    /// Get the subscriber's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }
}

impl Consumer for Subscriber {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn add_dep(self: Arc<Self>, dep: &Dep) {
        let this: Arc<dyn Consumer> = self;
        dep.add_subscriber(&this);
    }

    fn update(self: Arc<Self>) {
        (self.notify)();
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}
