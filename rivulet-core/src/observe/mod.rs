//! Observation
//!
//! This module turns plain data into reactive data.
//!
//! # Concepts
//!
//! ## Values
//!
//! [`Value`] is a dynamically typed tree of primitives, [`Object`]s and
//! [`Array`]s. Containers are shared handles; identity, not structure,
//! decides whether two values are the same.
//!
//! ## Observers
//!
//! [`observe`] attaches an [`Observer`] to a container. Observing an object
//! replaces each enumerable property with a reactive accessor (see
//! [`define_reactive`]); observing a list observes its elements, and the
//! list's mutators notify from then on. Observation is lazy and recursive:
//! nested containers are observed as they are stored.
//!
//! ## Shape changes
//!
//! Properties added or removed after observation are invisible to the
//! accessors. [`set`] and [`delete`] are the entry points that make such
//! changes reactive.
//!
//! # Example
//!
//! ```rust
//! use rivulet_core::{observe, set, Object, Value};
//!
//! let state = Value::from(Object::new().with("user", Object::new()));
//! observe(&state, false);
//!
//! let user = state.as_object().unwrap().get("user");
//! set(&user, "name", "ada");
//! assert!(user.as_object().unwrap().is_reactive("name"));
//! ```

mod api;
mod array;
mod object;
mod observer;
mod property;
mod traverse;
mod value;

pub use api::{delete, set};
pub use array::Array;
pub use object::{Getter, Object, ObjectKind, PropertyDescriptor, Setter};
pub use observer::{observe, Observer};
pub use property::{define_reactive, property_dep};
pub use traverse::traverse;
pub use value::{Key, Value};
