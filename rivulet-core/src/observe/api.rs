//! Shape mutation on observed containers.
//!
//! Accessors only intercept properties that existed when a container was
//! observed. [`set`] and [`delete`] add and remove properties (or list
//! slots) after the fact and notify the container's own dependency node.

use tracing::trace;

use super::object::ObjectKind;
use super::property::define_reactive;
use super::{Array, Key, Object, Value};
use crate::error::{warn, Warning};

/// Assign `key` on `target`, making it reactive if `target` is observed.
///
/// - lists: the slot at the index is replaced (the list is padded with
///   nulls first if it is too short), through the intercepted `splice`;
/// - existing own properties: plain assignment;
/// - instances and root-tracked containers: warns, then proceeds;
/// - unobserved objects: plain assignment;
/// - otherwise a reactive accessor is installed and the object's observer
///   notifies.
///
/// Returns the assigned value.
pub fn set(target: &Value, key: impl Into<Key>, value: impl Into<Value>) -> Value {
    let key = key.into();
    let value = value.into();

    match target {
        Value::Array(list) => set_index(list, &key, value.clone()),
        Value::Object(obj) => set_property(obj, &key.to_name(), value.clone()),
        _ => warn(Warning::SetOnPrimitive {
            key: key.to_name(),
        }),
    }
    value
}

fn set_index(list: &Array, key: &Key, value: Value) {
    let Some(index) = key.as_index() else {
        warn(Warning::InvalidListKey {
            key: key.to_name(),
        });
        return;
    };
    list.extend_to(index);
    list.splice(index, 1, [value]);
}

fn set_property(obj: &Object, key: &str, value: Value) {
    if obj.has_own(key) {
        obj.set(key, value);
        return;
    }

    let observer = obj.observer();
    let root_tracked = obj.kind() == ObjectKind::Instance
        || observer.as_ref().is_some_and(|ob| ob.root_count() > 0);
    if root_tracked {
        warn(Warning::AddToRoot {
            key: key.to_owned(),
        });
    }

    let Some(observer) = observer else {
        obj.set(key, value);
        return;
    };

    if define_reactive(obj, key, Some(value), false) {
        trace!(key, dep = observer.dep().id().raw(), "property added");
        observer.dep().notify();
    }
}

/// Remove `key` from `target`, notifying its observer.
///
/// Lists remove the slot through the intercepted `splice`. Absent keys are
/// ignored without a warning. Removing from an instance or a root-tracked
/// container warns, then proceeds.
pub fn delete(target: &Value, key: impl Into<Key>) {
    let key = key.into();

    match target {
        Value::Array(list) => match key.as_index() {
            Some(index) => {
                list.splice(index, 1, Vec::<Value>::new());
            }
            None => warn(Warning::InvalidListKey {
                key: key.to_name(),
            }),
        },
        Value::Object(obj) => delete_property(obj, &key.to_name()),
        _ => warn(Warning::DeleteOnPrimitive {
            key: key.to_name(),
        }),
    }
}

fn delete_property(obj: &Object, key: &str) {
    if !obj.has_own(key) {
        return;
    }

    let observer = obj.observer();
    let root_tracked = obj.kind() == ObjectKind::Instance
        || observer.as_ref().is_some_and(|ob| ob.root_count() > 0);
    if root_tracked {
        warn(Warning::DeleteFromRoot {
            key: key.to_owned(),
        });
    }

    if !obj.remove(key) {
        return;
    }
    if let Some(observer) = observer {
        trace!(key, dep = observer.dep().id().raw(), "property removed");
        observer.dep().notify();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::observe::{observe, PropertyDescriptor};
    use crate::reactive::{Consumer, Subscriber};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_subscriber(count: &Arc<AtomicUsize>) -> Arc<dyn Consumer> {
        let count = count.clone();
        Subscriber::new(move || {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn collect_warnings() -> (Arc<Mutex<Vec<Warning>>>, crate::config::ConfigGuard) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let guard = Config::default()
            .with_warn_handler(move |w| sink.lock().push(w.clone()))
            .install();
        (seen, guard)
    }

    #[test]
    fn set_adds_reactive_property_and_notifies() {
        let obj = Object::new().with("a", 1);
        let target = Value::from(obj.clone());
        let observer = observe(&target, false).unwrap();

        let count = Arc::new(AtomicUsize::new(0));
        let sub = counting_subscriber(&count);
        observer.dep().add_subscriber(&sub);

        assert_eq!(set(&target, "b", 2), Value::from(2));
        assert!(obj.is_reactive("b"));
        assert_eq!(obj.get("b"), Value::from(2));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn set_existing_key_assigns_through_accessor() {
        let obj = Object::new().with("a", 1);
        let target = Value::from(obj.clone());
        let observer = observe(&target, false).unwrap();

        let shape = Arc::new(AtomicUsize::new(0));
        let sub = counting_subscriber(&shape);
        observer.dep().add_subscriber(&sub);

        set(&target, "a", 5);
        assert_eq!(obj.get("a"), Value::from(5));
        assert_eq!(shape.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn set_on_unobserved_object_is_plain() {
        let obj = Object::new();
        set(&Value::from(obj.clone()), "a", 1);
        assert_eq!(obj.get("a"), Value::from(1));
        assert!(!obj.is_reactive("a"));
    }

    #[test]
    fn set_on_list_pads_and_notifies_once() {
        let list: Array = ["a", "b"].into_iter().collect();
        let target = Value::from(list.clone());
        let observer = observe(&target, false).unwrap();

        let count = Arc::new(AtomicUsize::new(0));
        let sub = counting_subscriber(&count);
        observer.dep().add_subscriber(&sub);

        set(&target, 5usize, "v");
        assert_eq!(list.len(), 6);
        assert_eq!(list.get(5), Some(Value::from("v")));
        assert!(list.get(3).unwrap().is_null());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        set(&target, "0", "z");
        assert_eq!(list.get(0), Some(Value::from("z")));
        assert_eq!(list.len(), 6);
    }

    #[test]
    fn set_observes_inserted_list_element() {
        let list = Array::new();
        let target = Value::from(list.clone());
        observe(&target, false);

        let item = Object::new().with("x", 1);
        set(&target, 0usize, item.clone());
        assert!(item.is_reactive("x"));
    }

    #[test]
    fn primitive_targets_warn() {
        let (seen, _guard) = collect_warnings();

        assert_eq!(set(&Value::Null, "a", 1), Value::from(1));
        delete(&Value::from(3), "a");

        assert_eq!(
            *seen.lock(),
            vec![
                Warning::SetOnPrimitive { key: "a".into() },
                Warning::DeleteOnPrimitive { key: "a".into() },
            ]
        );
    }

    #[test]
    fn non_index_list_keys_warn() {
        let (seen, _guard) = collect_warnings();
        let list: Array = [1].into_iter().collect();
        let target = Value::from(list.clone());

        set(&target, "name", 1);
        delete(&target, "name");
        assert_eq!(list.len(), 1);
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn root_mutation_warns_and_proceeds() {
        let (seen, _guard) = collect_warnings();
        let obj = Object::new().with("a", 1);
        let target = Value::from(obj.clone());
        observe(&target, true);

        set(&target, "b", 2);
        assert_eq!(obj.get("b"), Value::from(2));
        assert!(obj.is_reactive("b"));

        delete(&target, "a");
        assert!(!obj.has_own("a"));

        assert_eq!(
            *seen.lock(),
            vec![
                Warning::AddToRoot { key: "b".into() },
                Warning::DeleteFromRoot { key: "a".into() },
            ]
        );
    }

    #[test]
    fn instances_warn_and_are_assigned_plainly() {
        let (seen, _guard) = collect_warnings();
        let instance = Object::with_kind(ObjectKind::Instance);

        set(&Value::from(instance.clone()), "a", 1);
        assert_eq!(instance.get("a"), Value::from(1));
        assert!(!instance.is_reactive("a"));
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn delete_notifies_observer() {
        let obj = Object::new().with("a", 1).with("b", 2);
        let target = Value::from(obj.clone());
        let observer = observe(&target, false).unwrap();

        let count = Arc::new(AtomicUsize::new(0));
        let sub = counting_subscriber(&count);
        observer.dep().add_subscriber(&sub);

        delete(&target, "a");
        assert_eq!(obj.keys(), vec!["b"]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delete_absent_key_is_silent_noop() {
        let (seen, _guard) = collect_warnings();
        let obj = Object::new().with("a", 1);
        let target = Value::from(obj.clone());
        let observer = observe(&target, true).unwrap();

        let count = Arc::new(AtomicUsize::new(0));
        let sub = counting_subscriber(&count);
        observer.dep().add_subscriber(&sub);

        delete(&target, "missing");
        assert_eq!(obj.keys(), vec!["a"]);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn delete_non_configurable_does_not_notify() {
        let obj = Object::new();
        obj.define_property("fixed", PropertyDescriptor::data(1).non_configurable());
        let target = Value::from(obj.clone());
        let observer = observe(&target, false).unwrap();

        let count = Arc::new(AtomicUsize::new(0));
        let sub = counting_subscriber(&count);
        observer.dep().add_subscriber(&sub);

        delete(&target, "fixed");
        assert!(obj.has_own("fixed"));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn delete_list_index_removes_slot() {
        let list: Array = [1, 2, 3].into_iter().collect();
        let target = Value::from(list.clone());
        let observer = observe(&target, false).unwrap();

        let count = Arc::new(AtomicUsize::new(0));
        let sub = counting_subscriber(&count);
        observer.dep().add_subscriber(&sub);

        delete(&target, 1usize);
        assert_eq!(list.to_vec(), vec![Value::from(1), Value::from(3)]);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
