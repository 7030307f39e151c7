//! Computed Implementation
//!
//! A Computed is a cached derived value that re-evaluates only when its
//! dependencies change.
//!
//! # How Computed Values Work
//!
//! 1. On first access, the computation runs in its own reactive context and
//!    the result is cached.
//!
//! 2. When a dependency notifies, the computed value is only marked dirty.
//!    Nothing is recomputed until somebody reads it again.
//!
//! 3. When read inside another consumer, the computed value forwards its own
//!    dependencies to that consumer. The outer consumer is then notified
//!    directly by the underlying data, not by the computed value.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::context::ReactiveContext;
use super::tracker::DepTracker;
use super::{Consumer, Dep, SubscriberId};

/// Cache state for a computed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputedState {
    /// The cached value is up-to-date.
    Clean,

    /// A dependency changed, or nothing has been computed yet.
    Dirty,
}

struct ComputedInner<T> {
    id: SubscriberId,
    compute: Box<dyn Fn() -> T + Send + Sync>,
    value: Mutex<Option<T>>,
    state: Mutex<ComputedState>,
    tracker: Mutex<DepTracker>,
}

impl<T> ComputedInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn evaluate(self: &Arc<Self>) -> T {
        let this: Arc<dyn Consumer> = self.clone();
        let value = {
            let _ctx = ReactiveContext::enter(this.clone());
            (self.compute)()
        };

        let stale = self.tracker.lock().finish();
        for dep in stale {
            dep.remove_subscriber(&this);
        }

        *self.value.lock() = Some(value.clone());
        *self.state.lock() = ComputedState::Clean;
        value
    }
}

impl<T> Consumer for ComputedInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn add_dep(self: Arc<Self>, dep: &Dep) {
        let subscribe = self.tracker.lock().record(dep);
        if subscribe {
            let this: Arc<dyn Consumer> = self;
            dep.add_subscriber(&this);
        }
    }

    fn update(self: Arc<Self>) {
        *self.state.lock() = ComputedState::Dirty;
    }
}

/// A lazily evaluated, cached derived value.
pub struct Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<ComputedInner<T>>,
}

impl<T> Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a computed value. Nothing runs until the first read.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(ComputedInner {
                id: SubscriberId::new(),
                compute: Box::new(compute),
                value: Mutex::new(None),
                state: Mutex::new(ComputedState::Dirty),
                tracker: Mutex::new(DepTracker::default()),
            }),
        }
    }

    /// Get the subscriber ID for this computed value.
    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// Read the value, recomputing it if a dependency changed.
    pub fn get(&self) -> T {
        let cached = match self.state() {
            ComputedState::Clean => self.inner.value.lock().clone(),
            ComputedState::Dirty => None,
        };
        let value = match cached {
            Some(value) => value,
            None => self.inner.evaluate(),
        };

        if ReactiveContext::is_active() {
            self.depend();
        }
        value
    }

    /// Subscribe the active consumer to everything this value depends on.
    pub fn depend(&self) {
        let deps: Vec<Dep> = self.inner.tracker.lock().deps().to_vec();
        for dep in deps {
            dep.depend();
        }
    }

    /// Get the current cache state.
    pub fn state(&self) -> ComputedState {
        *self.inner.state.lock()
    }

    /// Force the next read to recompute.
    pub fn mark_dirty(&self) {
        *self.inner.state.lock() = ComputedState::Dirty;
    }

    /// Check if a value has been computed.
    pub fn has_value(&self) -> bool {
        self.inner.value.lock().is_some()
    }

    /// Number of dependencies read by the last evaluation.
    pub fn dependency_count(&self) -> usize {
        self.inner.tracker.lock().deps().len()
    }
}

impl<T> Clone for Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Computed<T>
where
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("value", &*self.inner.value.lock())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
