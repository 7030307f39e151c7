//! Container observers.
//!
//! An [`Observer`] is attached to a container the first time it is passed to
//! [`observe`]. It owns the container's own dependency node ("this container
//! changed shape") and, at construction, instruments the container:
//!
//! - objects: every enumerable own property is replaced by a reactive
//!   accessor;
//! - lists: every existing element is observed (list mutators are always
//!   intercepted, see [`Array`]).
//!
//! The observer is attached before the children are walked, so a container
//! reachable from itself is observed exactly once.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use tracing::debug;

use super::array::ArrayInner;
use super::object::{ObjectInner, ObjectKind};
use super::property::define_reactive;
use super::{Array, Object, Value};
use crate::config;
use crate::reactive::Dep;

enum Target {
    Object(Weak<ObjectInner>),
    Array(Weak<ArrayInner>),
}

/// Per-container reactive state.
///
/// The container holds its observer strongly; the observer refers back
/// weakly.
pub struct Observer {
    target: Target,
    dep: Dep,
    root_count: AtomicUsize,
}

impl Observer {
    /// The container's own dependency node.
    pub fn dep(&self) -> &Dep {
        &self.dep
    }

    /// How many times the container was registered as a root.
    pub fn root_count(&self) -> usize {
        self.root_count.load(Ordering::SeqCst)
    }

    /// The observed container, if it is still alive.
    pub fn value(&self) -> Option<Value> {
        match &self.target {
            Target::Object(weak) => weak.upgrade().map(|o| Value::Object(Object::from_inner(o))),
            Target::Array(weak) => weak.upgrade().map(|a| Value::Array(Array::from_inner(a))),
        }
    }

    /// Observe each item. Nested containers recurse through [`observe`].
    pub fn observe_array(&self, items: &[Value]) {
        for item in items {
            observe(item, false);
        }
    }

    fn walk(obj: &Object) {
        for key in obj.keys() {
            define_reactive(obj, &key, None, false);
        }
    }

    fn attach_object(obj: &Object) -> Arc<Observer> {
        let observer = Arc::new(Observer {
            target: Target::Object(obj.downgrade()),
            dep: Dep::new(),
            root_count: AtomicUsize::new(0),
        });
        let attached = obj.attach_observer(observer.clone());
        if Arc::ptr_eq(&attached, &observer) {
            debug!(dep = observer.dep.id().raw(), keys = obj.len(), "observing object");
            Self::walk(obj);
        }
        attached
    }

    fn attach_array(arr: &Array) -> Arc<Observer> {
        let observer = Arc::new(Observer {
            target: Target::Array(arr.downgrade()),
            dep: Dep::new(),
            root_count: AtomicUsize::new(0),
        });
        let attached = arr.attach_observer(observer.clone());
        if Arc::ptr_eq(&attached, &observer) {
            debug!(dep = observer.dep.id().raw(), len = arr.len(), "observing list");
            observer.observe_array(&arr.to_vec());
        }
        attached
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.target {
            Target::Object(_) => "object",
            Target::Array(_) => "list",
        };
        f.debug_struct("Observer")
            .field("kind", &kind)
            .field("dep", &self.dep)
            .field("root_count", &self.root_count())
            .finish()
    }
}

fn should_observe() -> bool {
    config::is_observing() && !config::server_rendering()
}

/// Attach an observer to `value`, or return the one already attached.
///
/// Returns `None` for primitives, render nodes, framework instances,
/// non-extensible containers, and whenever observation is switched off or
/// the configuration is in server-rendering mode. An existing observer is
/// returned regardless of those switches.
///
/// `as_root` marks the value as the top-level state of some scope; it only
/// bumps [`Observer::root_count`].
pub fn observe(value: &Value, as_root: bool) -> Option<Arc<Observer>> {
    let observer = match value {
        Value::Object(obj) => {
            if obj.kind() == ObjectKind::RenderNode {
                return None;
            }
            match obj.observer() {
                Some(existing) => Some(existing),
                None if should_observe()
                    && obj.kind() == ObjectKind::Plain
                    && obj.is_extensible() =>
                {
                    Some(Observer::attach_object(obj))
                }
                None => {
                    debug!(kind = ?obj.kind(), "object left unobserved");
                    None
                }
            }
        }
        Value::Array(arr) => match arr.observer() {
            Some(existing) => Some(existing),
            None if should_observe() && arr.is_extensible() => Some(Observer::attach_array(arr)),
            None => {
                debug!("list left unobserved");
                None
            }
        },
        _ => return None,
    };

    if as_root {
        if let Some(observer) = &observer {
            observer.root_count.fetch_add(1, Ordering::SeqCst);
        }
    }
    observer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{toggle_observing, without_observing, Config};

    #[test]
    fn observe_is_idempotent() {
        let value = Value::from(Object::new().with("a", 1));
        let first = observe(&value, false).unwrap();
        let second = observe(&value, false).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn observe_makes_enumerable_keys_reactive() {
        let obj = Object::new().with("a", 1).with("b", 2);
        obj.define_property(
            "hidden",
            crate::observe::PropertyDescriptor::data(3).non_enumerable(),
        );
        observe(&Value::from(obj.clone()), false);

        assert!(obj.is_reactive("a"));
        assert!(obj.is_reactive("b"));
        assert!(!obj.is_reactive("hidden"));
    }

    #[test]
    fn primitives_are_not_observed() {
        assert!(observe(&Value::from(1), false).is_none());
        assert!(observe(&Value::from("x"), false).is_none());
        assert!(observe(&Value::Null, true).is_none());
    }

    #[test]
    fn excluded_kinds_are_skipped() {
        let node = Object::with_kind(ObjectKind::RenderNode).with("tag", "div");
        let instance = Object::with_kind(ObjectKind::Instance).with("a", 1);

        assert!(observe(&Value::from(node.clone()), false).is_none());
        assert!(observe(&Value::from(instance.clone()), false).is_none());
        assert!(!node.is_reactive("tag"));
        assert!(!instance.is_reactive("a"));
    }

    #[test]
    fn non_extensible_values_are_skipped() {
        let frozen = Object::new().with("a", 1);
        frozen.freeze();
        let sealed_list: Array = [1].into_iter().collect();
        sealed_list.prevent_extensions();

        assert!(observe(&Value::from(frozen), false).is_none());
        assert!(observe(&Value::from(sealed_list), false).is_none());
    }

    #[test]
    fn switches_disable_new_observers_only() {
        let before = Value::from(Object::new());
        let existing = observe(&before, false).unwrap();

        without_observing(|| {
            assert!(observe(&Value::from(Object::new()), false).is_none());
            let again = observe(&before, false).unwrap();
            assert!(Arc::ptr_eq(&existing, &again));
        });

        let _cfg = Config {
            server_rendering: true,
            ..Config::default()
        }
        .install();
        assert!(observe(&Value::from(Array::new()), false).is_none());
        assert!(toggle_observing(true));
    }

    #[test]
    fn root_registration_counts() {
        let value = Value::from(Object::new());
        let observer = observe(&value, true).unwrap();
        observe(&value, true);
        observe(&value, false);
        assert_eq!(observer.root_count(), 2);
    }

    #[test]
    fn lists_observe_nested_elements() {
        let inner = Object::new().with("x", 1);
        let nested: Array = [Value::from(inner.clone())].into_iter().collect();
        let outer: Array = [Value::from(nested.clone()), Value::from(3)]
            .into_iter()
            .collect();

        observe(&Value::from(outer), false);
        assert!(nested.observer().is_some());
        assert!(inner.observer().is_some());
        assert!(inner.is_reactive("x"));
    }

    #[test]
    fn cyclic_graphs_terminate() {
        let obj = Object::new().with("name", "loop");
        obj.set("me", obj.clone());
        let list = Array::new();
        list.push([Value::from(list.clone())]);

        let observer = observe(&Value::from(obj.clone()), false).unwrap();
        assert!(obj.is_reactive("me"));
        assert!(Arc::ptr_eq(&obj.get("me").observer().unwrap(), &observer));
        assert!(observe(&Value::from(list), false).is_some());
    }

    #[test]
    fn observer_value_points_back() {
        let obj = Object::new();
        let observer = observe(&Value::from(obj.clone()), false).unwrap();
        assert!(observer.value().unwrap().same(&Value::from(obj)));
    }
}
