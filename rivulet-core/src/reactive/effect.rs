//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. Every run happens inside a [`ReactiveContext`] for the effect, so each
//!    tracked read subscribes it. A dep read several times in one run is
//!    subscribed once.
//!
//! 3. After a run, the effect unsubscribes from deps it no longer reads.
//!
//! 4. When any dependency notifies, a sync effect re-runs on the spot and
//!    any other effect is handed to the [scheduler](super::scheduler).

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::context::ReactiveContext;
use super::scheduler::{self, Job};
use super::tracker::DepTracker;
use super::{Consumer, Dep, SubscriberId};

struct EffectInner {
    id: SubscriberId,

    /// The effect function.
    run: Box<dyn Fn() + Send + Sync>,

    /// Re-run inside `update()` instead of queuing.
    sync: bool,

    tracker: Mutex<DepTracker>,

    disposed: AtomicBool,

    run_count: AtomicUsize,
}

impl EffectInner {
    fn execute(self: &Arc<Self>) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }

        let this: Arc<dyn Consumer> = self.clone();
        {
            let _ctx = ReactiveContext::enter(this.clone());
            (self.run)();
        }

        let stale = self.tracker.lock().finish();
        for dep in stale {
            dep.remove_subscriber(&this);
        }

        self.run_count.fetch_add(1, Ordering::SeqCst);
    }
}

impl Consumer for EffectInner {
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
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        if self.sync {
            self.execute();
        } else {
            trace!(effect = self.id.raw(), "queued");
            scheduler::queue_job(self);
        }
    }
}

impl Job for EffectInner {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn run(self: Arc<Self>) {
        self.execute();
    }
}

/// A side-effecting computation that runs when dependencies change.
///
/// # Example
///
/// ```rust
/// use rivulet_core::{observe, Effect, Object, Value};
///
/// let state = Object::new().with("count", 0);
/// observe(&Value::from(state.clone()), true);
///
/// let state_clone = state.clone();
/// let effect = Effect::new_sync(move || {
///     let _ = state_clone.get("count");
/// });
///
/// state.set("count", 5); // re-runs the effect
/// assert_eq!(effect.run_count(), 2);
/// ```
#[derive(Clone)]
pub struct Effect {
    inner: Arc<EffectInner>,
}

impl Effect {
    fn build<F>(run: F, sync: bool) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(EffectInner {
                id: SubscriberId::new(),
                run: Box::new(run),
                sync,
                tracker: Mutex::new(DepTracker::default()),
                disposed: AtomicBool::new(false),
                run_count: AtomicUsize::new(0),
            }),
        }
    }

    /// Create a scheduled effect and run it once to establish dependencies.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let effect = Self::build(run, false);
        effect.execute();
        effect
    }

    /// Create an effect that re-runs synchronously inside `notify()`.
    pub fn new_sync<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let effect = Self::build(run, true);
        effect.execute();
        effect
    }

    /// Create a scheduled effect without running it.
    pub fn new_lazy<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::build(run, false)
    }

    /// Get the subscriber ID for this effect.
    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// This effect as a consumer handle.
    pub fn as_consumer(&self) -> Arc<dyn Consumer> {
        self.inner.clone()
    }

    /// Run the effect now, re-collecting its dependencies.
    pub fn execute(&self) {
        self.inner.execute();
    }

    /// Queue the effect on the scheduler.
    pub fn schedule(&self) {
        if !self.is_disposed() {
            scheduler::queue_job(self.inner.clone());
        }
    }

    /// Stop the effect and unsubscribe it from every dependency.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let this = self.as_consumer();
        let deps = self.inner.tracker.lock().clear();
        for dep in deps {
            dep.remove_subscriber(&this);
        }
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::SeqCst)
    }

    /// Get the number of distinct dependencies read by the last run.
    pub fn dependency_count(&self) -> usize {
        self.inner.tracker.lock().deps().len()
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("sync", &self.inner.sync)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn effect_runs_on_creation() {
        let effect = Effect::new(|| {});
        assert_eq!(effect.run_count(), 1);
    }

    #[test]
    fn effect_lazy_does_not_run_on_creation() {
        let effect = Effect::new_lazy(|| {});
        assert_eq!(effect.run_count(), 0);

        effect.execute();
        assert_eq!(effect.run_count(), 1);
    }

    #[test]
    fn effect_subscribes_once_per_dep() {
        let dep = Dep::new();
        let dep_clone = dep.clone();
        let effect = Effect::new_sync(move || {
            dep_clone.depend();
            dep_clone.depend();
        });

        assert_eq!(dep.subscriber_count(), 1);
        assert_eq!(effect.dependency_count(), 1);

        effect.execute();
        assert_eq!(dep.subscriber_count(), 1);
    }

    #[test]
    fn sync_effect_reruns_on_notify() {
        let dep = Dep::new();
        let dep_clone = dep.clone();
        let effect = Effect::new_sync(move || dep_clone.depend());

        dep.notify();
        dep.notify();
        assert_eq!(effect.run_count(), 3);
    }

    #[test]
    fn scheduled_effect_waits_for_flush() {
        let dep = Dep::new();
        let dep_clone = dep.clone();
        let effect = Effect::new(move || dep_clone.depend());

        dep.notify();
        dep.notify();
        assert_eq!(effect.run_count(), 1);
        assert_eq!(scheduler::pending(), 1);

        scheduler::flush();
        assert_eq!(effect.run_count(), 2);
    }

    #[test]
    fn scheduled_effect_runs_immediately_without_async() {
        let _cfg = Config {
            async_updates: false,
            ..Config::default()
        }
        .install();

        let dep = Dep::new();
        let dep_clone = dep.clone();
        let effect = Effect::new(move || dep_clone.depend());

        dep.notify();
        assert_eq!(effect.run_count(), 2);
    }

    #[test]
    fn stale_deps_are_dropped() {
        let first = Dep::new();
        let second = Dep::new();
        let use_first = Arc::new(AtomicBool::new(true));

        let (first_clone, second_clone, flag) = (first.clone(), second.clone(), use_first.clone());
        let effect = Effect::new_sync(move || {
            if flag.load(Ordering::SeqCst) {
                first_clone.depend();
            } else {
                second_clone.depend();
            }
        });
        assert_eq!(first.subscriber_count(), 1);

        use_first.store(false, Ordering::SeqCst);
        effect.execute();

        assert_eq!(first.subscriber_count(), 0);
        assert_eq!(second.subscriber_count(), 1);
    }

    #[test]
    fn effect_does_not_run_after_disposal() {
        let dep = Dep::new();
        let dep_clone = dep.clone();
        let effect = Effect::new_sync(move || dep_clone.depend());

        effect.dispose();
        assert!(effect.is_disposed());
        assert_eq!(dep.subscriber_count(), 0);

        dep.notify();
        effect.schedule();
        effect.execute();
        scheduler::flush();
        assert_eq!(effect.run_count(), 1);
    }

    #[test]
    fn effect_clone_shares_state() {
        let effect1 = Effect::new(|| {});
        let effect2 = effect1.clone();

        assert_eq!(effect1.id(), effect2.id());

        effect1.execute();
        assert_eq!(effect2.run_count(), 2);

        effect1.dispose();
        assert!(effect2.is_disposed());
    }

    #[test]
    fn nested_effect_restores_outer_context() {
        let outer_dep = Dep::new();
        let inner_dep = Dep::new();

        let (outer_clone, inner_clone) = (outer_dep.clone(), inner_dep.clone());
        let children: Arc<Mutex<Vec<Effect>>> = Arc::new(Mutex::new(Vec::new()));
        let children_clone = children.clone();

        let outer = Effect::new_sync(move || {
            let inner_clone = inner_clone.clone();
            let child = Effect::new_sync(move || inner_clone.depend());
            children_clone.lock().push(child);
            outer_clone.depend();
        });

        let child_id = children.lock()[0].id();
        assert!(outer_dep.has_subscriber(&outer.as_consumer()));
        assert!(!inner_dep.has_subscriber(&outer.as_consumer()));
        assert_eq!(inner_dep.subscriber_count(), 1);
        assert!(outer.id() < child_id);
    }
}
