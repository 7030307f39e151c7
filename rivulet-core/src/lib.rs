//! Rivulet Core
//!
//! This crate provides the dependency-tracking engine for the Rivulet
//! reactive view layer. It implements:
//!
//! - Dependency nodes and the active-consumer stack
//! - Consumers (effects, computed values) and the update scheduler
//! - Observation of plain data: reactive property accessors, intercepted
//!   list mutators, and the `set`/`delete` shape-mutation API
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: dependency nodes, consumers, and scheduling
//! - `observe`: the reactive value model and its instrumentation
//! - `config`: per-thread engine flags
//! - `error`: developer warnings and configuration errors
//!
//! Reads and writes go through explicit accessors (`Object::get`,
//! `Object::set`, the `Array` mutators) rather than field syntax.
//!
//! # Example
//!
//! ```rust
//! use rivulet_core::{observe, Effect, Object, Value};
//! use std::sync::{Arc, Mutex};
//!
//! let state = Object::new().with("count", 0);
//! observe(&Value::from(state.clone()), false);
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let effect = Effect::new_sync({
//!     let (state, seen) = (state.clone(), seen.clone());
//!     move || seen.lock().unwrap().push(state.get("count"))
//! });
//!
//! state.set("count", 5);
//! assert_eq!(effect.run_count(), 2);
//! assert_eq!(*seen.lock().unwrap(), vec![Value::from(0), Value::from(5)]);
//! ```

pub mod config;
pub mod error;
pub mod observe;
pub mod reactive;

pub use config::{is_observing, toggle_observing, without_observing, Config};
pub use error::{ConfigError, Warning};
pub use observe::{
    define_reactive, delete, observe, set, traverse, Array, Key, Object, ObjectKind, Observer,
    PropertyDescriptor, Value,
};
pub use reactive::{Computed, Consumer, Dep, Effect, ReactiveContext, Subscriber, SubscriberId};
