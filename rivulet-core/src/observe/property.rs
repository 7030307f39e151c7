//! Reactive property accessors.
//!
//! [`define_reactive`] replaces a property with an accessor backed by its own
//! dependency node. Reads subscribe the active consumer to that node, to the
//! observer of the stored value, and, for lists, to the observers of every
//! element reachable through nested lists. Writes of a different value
//! re-observe the new value and notify.

use std::sync::Arc;

use parking_lot::RwLock;
use smallvec::SmallVec;
use tracing::trace;

use super::object::{Getter, Setter, Slot};
use super::{observe, Array, Object, Observer, Value};
use crate::reactive::{Dep, ReactiveContext};

pub(crate) struct ReactiveProperty {
    dep: Dep,
    value: RwLock<Value>,
    child: RwLock<Option<Arc<Observer>>>,
    getter: Option<Getter>,
    setter: Option<Setter>,
    shallow: bool,
}

impl ReactiveProperty {
    fn current(&self) -> Value {
        match &self.getter {
            Some(getter) => getter(),
            None => self.value.read().clone(),
        }
    }

    pub(crate) fn get(&self) -> Value {
        let value = self.current();

        if ReactiveContext::is_active() {
            self.dep.depend();
            let child = self.child.read().clone();
            if let Some(child) = child {
                child.dep().depend();
                if let Value::Array(list) = &value {
                    depend_array(list);
                }
            }
        }
        value
    }

    pub(crate) fn set(&self, new_value: Value) {
        let current = self.current();
        if new_value.same(&current) || (new_value.is_nan() && current.is_nan()) {
            return;
        }
        if self.getter.is_some() && self.setter.is_none() {
            return;
        }

        let child = if self.shallow {
            None
        } else {
            observe(&new_value, false)
        };

        match &self.setter {
            Some(setter) => setter(new_value),
            None => *self.value.write() = new_value,
        }
        *self.child.write() = child;

        trace!(dep = self.dep.id().raw(), "reactive write");
        self.dep.notify();
    }

    pub(crate) fn dep(&self) -> &Dep {
        &self.dep
    }
}

/// Subscribe the active consumer to the observer of every element of
/// `list`, descending into nested lists. Each list is visited once.
fn depend_array(list: &Array) {
    let mut visited: SmallVec<[usize; 8]> = SmallVec::new();
    depend_items(list, &mut visited);
}

fn depend_items(list: &Array, visited: &mut SmallVec<[usize; 8]>) {
    if visited.contains(&list.addr()) {
        return;
    }
    visited.push(list.addr());

    for item in list.to_vec() {
        if let Some(observer) = item.observer() {
            observer.dep().depend();
        }
        if let Value::Array(nested) = &item {
            depend_items(nested, visited);
        }
    }
}

/// Turn `key` on `obj` into a reactive accessor.
///
/// `value` overrides the stored value; without it the current value is
/// used. Existing custom getters and setters are kept and delegated to.
/// With `shallow`, the stored value is left unobserved.
///
/// Returns false, leaving the property untouched, if it is
/// non-configurable, or if it is new and `obj` is non-extensible.
pub fn define_reactive(obj: &Object, key: &str, value: Option<Value>, shallow: bool) -> bool {
    let (getter, setter, stored) = match obj.slot(key) {
        Some(Slot::Data(desc)) if !desc.configurable => return false,
        Some(Slot::Data(desc)) => (desc.getter, desc.setter, desc.value),
        Some(Slot::Reactive(prop)) => {
            // Redefining chains onto the existing accessor.
            let (read, write) = (prop.clone(), prop);
            let getter: Getter = Arc::new(move || read.get());
            let setter: Setter = Arc::new(move |v| write.set(v));
            (Some(getter), Some(setter), Value::Null)
        }
        None if !obj.is_extensible() => return false,
        None => (None, None, Value::Null),
    };

    let value = match value {
        Some(value) => value,
        None => match (&getter, &setter) {
            (None, _) => stored,
            (Some(getter), Some(_)) => getter(),
            (Some(_), None) => Value::Null,
        },
    };

    let child = if shallow { None } else { observe(&value, false) };

    let prop = Arc::new(ReactiveProperty {
        dep: Dep::new(),
        value: RwLock::new(value),
        child: RwLock::new(child),
        getter,
        setter,
        shallow,
    });
    obj.install_reactive(key, prop);
    true
}

/// The dependency node behind a reactive property.
pub fn property_dep(obj: &Object, key: &str) -> Option<Dep> {
    match obj.slot(key) {
        Some(Slot::Reactive(prop)) => Some(prop.dep().clone()),
        _ => None,
    }
}
