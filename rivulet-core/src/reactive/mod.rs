//! Reactive Primitives
//!
//! This module implements the dependency-tracking substrate: dependency
//! nodes, the active-consumer stack, and the consumers that subscribe to
//! nodes.
//!
//! # Concepts
//!
//! ## Dependency nodes
//!
//! A [`Dep`] stands for "something that can change". Tracked reads call
//! [`Dep::depend`], which subscribes whatever consumer is currently
//! evaluating. Writes call [`Dep::notify`], which calls `update()` on every
//! subscriber.
//!
//! ## Consumers
//!
//! A [`Consumer`] is a computation that can be subscribed and re-invoked.
//! [`Effect`] re-runs a side effect; [`Computed`] caches a derived value and
//! recomputes it lazily; [`Subscriber`] is a bare callback.
//!
//! ## Scheduling
//!
//! Effects that are not `sync` hand themselves to the [`scheduler`], which
//! runs them in creation order with duplicates removed.
//!
//! # Implementation Notes
//!
//! The active consumer is tracked with a thread-local stack (see
//! [`ReactiveContext`]). Reads check the top of the stack and, if a consumer
//! is present, register the dependency.

mod computed;
mod context;
mod dep;
mod effect;
pub mod scheduler;
mod subscriber;
mod tracker;

pub use computed::{Computed, ComputedState};
pub use context::{pop_target, push_target, untracked, ReactiveContext};
pub use dep::{Dep, DepId};
pub use effect::Effect;
pub use scheduler::Job;
pub use subscriber::{Consumer, Subscriber, SubscriberId};
