//! Reactive Context
//!
//! The reactive context tracks which consumer is currently evaluating.
//! When a tracked value is read, its dependency node asks the context for
//! the active consumer and subscribes it.
//!
//! # Implementation
//!
//! We use a thread-local stack. Entering a context pushes a consumer (or an
//! empty entry, which suspends tracking); dropping the guard pops it. After a
//! pop the new top, possibly empty, is the active consumer again. A stack
//! rather than a single slot is what makes nested evaluation work, e.g. a
//! parent effect that synchronously builds a child effect.

use std::cell::RefCell;
use std::sync::Arc;

use super::{Consumer, SubscriberId};

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Option<Arc<dyn Consumer>>>> = const { RefCell::new(Vec::new()) };
}

/// Guard that pops the context when dropped.
///
/// This keeps the stack balanced even if the computation panics.
#[must_use = "the context is exited when the guard is dropped"]
pub struct ReactiveContext {
    subscriber_id: Option<SubscriberId>,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given consumer.
    ///
    /// While this context is active, reads of tracked values subscribe the
    /// consumer.
    pub fn enter(consumer: Arc<dyn Consumer>) -> Self {
        let subscriber_id = Some(consumer.id());
        push_target(Some(consumer));
        Self { subscriber_id }
    }

    /// Enter a context with no active consumer. Reads inside it are not tracked.
    pub fn untracked() -> Self {
        push_target(None);
        Self {
            subscriber_id: None,
        }
    }

    /// Check if there is an active consumer.
    pub fn is_active() -> bool {
        CONTEXT_STACK.with(|stack| matches!(stack.borrow().last(), Some(Some(_))))
    }

    /// The active consumer, if any.
    pub fn current() -> Option<Arc<dyn Consumer>> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().cloned().flatten())
    }

    /// Get the current subscriber ID, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .and_then(|entry| entry.as_ref().map(|c| c.id()))
        })
    }

    /// Number of entries on the stack, empty entries included.
    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        let popped = pop_target();

        // Catch guards dropped out of order.
        debug_assert_eq!(
            popped.as_ref().map(|c| c.id()),
            self.subscriber_id,
            "ReactiveContext mismatch"
        );
    }
}

/// Push a consumer (or no consumer) onto the stack.
///
/// Prefer [`ReactiveContext`]; raw pushes must be paired with [`pop_target`].
pub fn push_target(target: Option<Arc<dyn Consumer>>) {
    CONTEXT_STACK.with(|stack| stack.borrow_mut().push(target));
}

/// Pop the top of the stack, returning the consumer that was active.
pub fn pop_target() -> Option<Arc<dyn Consumer>> {
    CONTEXT_STACK.with(|stack| stack.borrow_mut().pop().flatten())
}

/// Run `f` without an active consumer.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let _ctx = ReactiveContext::untracked();
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Subscriber;

    #[test]
    fn context_tracks_subscriber() {
        let sub = Subscriber::new(|| {});
        let id = sub.id();

        assert!(!ReactiveContext::is_active());
        assert!(ReactiveContext::current_subscriber().is_none());

        {
            let _ctx = ReactiveContext::enter(sub);

            assert!(ReactiveContext::is_active());
            assert_eq!(ReactiveContext::current_subscriber(), Some(id));
        }

        // Context should be cleaned up after drop
        assert!(!ReactiveContext::is_active());
        assert!(ReactiveContext::current_subscriber().is_none());
    }

    #[test]
    fn nested_contexts() {
        let sub1 = Subscriber::new(|| {});
        let sub2 = Subscriber::new(|| {});
        let (id1, id2) = (sub1.id(), sub2.id());

        {
            let _ctx1 = ReactiveContext::enter(sub1);
            assert_eq!(ReactiveContext::current_subscriber(), Some(id1));

            {
                let _ctx2 = ReactiveContext::enter(sub2);
                assert_eq!(ReactiveContext::current_subscriber(), Some(id2));
                assert_eq!(ReactiveContext::depth(), 2);
            }

            // After inner context drops, outer should be current
            assert_eq!(ReactiveContext::current_subscriber(), Some(id1));
        }

        assert!(ReactiveContext::current_subscriber().is_none());
    }

    #[test]
    fn untracked_suspends_outer_consumer() {
        let sub = Subscriber::new(|| {});
        let id = sub.id();
        let _ctx = ReactiveContext::enter(sub);

        let inner = untracked(ReactiveContext::current_subscriber);
        assert!(inner.is_none());
        assert_eq!(ReactiveContext::current_subscriber(), Some(id));
    }

    #[test]
    fn raw_push_and_pop() {
        let sub: Arc<dyn Consumer> = Subscriber::new(|| {});
        push_target(Some(sub.clone()));
        push_target(None);
        assert!(!ReactiveContext::is_active());
        assert!(pop_target().is_none());
        assert!(ReactiveContext::is_active());
        assert_eq!(pop_target().map(|c| c.id()), Some(sub.id()));
        assert_eq!(ReactiveContext::depth(), 0);
    }
}
