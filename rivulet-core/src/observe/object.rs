//! Map-like containers.
//!
//! An [`Object`] is an ordered map of named properties. Each property is
//! either a plain data slot described by a [`PropertyDescriptor`] or, once
//! the object is observed, a reactive accessor whose reads subscribe the
//! active consumer and whose writes notify.
//!
//! Property access goes through explicit methods: [`Object::get`] and
//! [`Object::set`] play the part of field reads and assignments.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::property::ReactiveProperty;
use super::{Observer, Value};

/// Custom read behavior for a property.
pub type Getter = Arc<dyn Fn() -> Value + Send + Sync>;

/// Custom write behavior for a property.
pub type Setter = Arc<dyn Fn(Value) + Send + Sync>;

/// What an object is for. Only `Plain` objects are ever observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectKind {
    /// Ordinary data.
    #[default]
    Plain,
    /// A rendering layer's internal node. Never observed.
    RenderNode,
    /// A framework-owned root instance. Never observed; adding or removing
    /// properties on it through [`set`](super::set)/[`delete`](super::delete)
    /// warns.
    Instance,
}

/// Shape and behavior of a plain property.
#[derive(Clone)]
pub struct PropertyDescriptor {
    pub value: Value,
    pub getter: Option<Getter>,
    pub setter: Option<Setter>,
    pub enumerable: bool,
    pub configurable: bool,
    pub writable: bool,
}

impl PropertyDescriptor {
    /// An enumerable, configurable, writable data property.
    pub fn data(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            getter: None,
            setter: None,
            enumerable: true,
            configurable: true,
            writable: true,
        }
    }

    /// A read-only computed property.
    pub fn getter<G>(get: G) -> Self
    where
        G: Fn() -> Value + Send + Sync + 'static,
    {
        Self {
            getter: Some(Arc::new(get)),
            ..Self::data(Value::Null)
        }
    }

    /// A property with custom read and write behavior.
    pub fn accessor<G, S>(get: G, set: S) -> Self
    where
        G: Fn() -> Value + Send + Sync + 'static,
        S: Fn(Value) + Send + Sync + 'static,
    {
        Self {
            getter: Some(Arc::new(get)),
            setter: Some(Arc::new(set)),
            ..Self::data(Value::Null)
        }
    }

    pub fn non_enumerable(mut self) -> Self {
        self.enumerable = false;
        self
    }

    pub fn non_configurable(mut self) -> Self {
        self.configurable = false;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("value", &self.value)
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .field("enumerable", &self.enumerable)
            .field("configurable", &self.configurable)
            .field("writable", &self.writable)
            .finish()
    }
}

#[derive(Clone)]
pub(crate) enum Slot {
    Data(PropertyDescriptor),
    Reactive(Arc<ReactiveProperty>),
}

pub(crate) struct ObjectInner {
    kind: ObjectKind,
    extensible: AtomicBool,
    slots: RwLock<IndexMap<String, Slot>>,
    observer: OnceLock<Arc<Observer>>,
}

/// A shared handle to a map-like container. Cloning shares the container.
#[derive(Clone)]
pub struct Object {
    inner: Arc<ObjectInner>,
}

impl Object {
    /// An empty plain object.
    pub fn new() -> Self {
        Self::with_kind(ObjectKind::Plain)
    }

    /// An empty object of the given kind.
    pub fn with_kind(kind: ObjectKind) -> Self {
        Self {
            inner: Arc::new(ObjectInner {
                kind,
                extensible: AtomicBool::new(true),
                slots: RwLock::new(IndexMap::new()),
                observer: OnceLock::new(),
            }),
        }
    }

    /// Builder form of [`Object::set`].
    pub fn with(self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn kind(&self) -> ObjectKind {
        self.inner.kind
    }

    /// Read a property. Missing properties read as `Null`.
    ///
    /// Reactive properties subscribe the active consumer.
    pub fn get(&self, key: &str) -> Value {
        match self.slot(key) {
            None => Value::Null,
            Some(Slot::Reactive(prop)) => prop.get(),
            Some(Slot::Data(desc)) => match desc.getter {
                Some(getter) => getter(),
                None => desc.value,
            },
        }
    }

    /// Assign a property.
    ///
    /// Reactive properties notify. For plain properties a custom setter is
    /// called; getter-only and read-only properties ignore the write. A new
    /// key is added as a plain property (not reactive, even on an observed
    /// object) unless the object is non-extensible, in which case the write
    /// is ignored.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.slot(key) {
            Some(Slot::Reactive(prop)) => prop.set(value),
            Some(Slot::Data(desc)) => {
                if let Some(setter) = desc.setter {
                    setter(value);
                } else if desc.getter.is_none() && desc.writable {
                    if let Some(Slot::Data(desc)) = self.inner.slots.write().get_mut(key) {
                        desc.value = value;
                    }
                }
            }
            None => {
                if self.is_extensible() {
                    self.inner
                        .slots
                        .write()
                        .insert(key.to_owned(), Slot::Data(PropertyDescriptor::data(value)));
                }
            }
        }
    }

    /// Install a plain property. Returns false if the existing property is
    /// non-configurable, or if the key is new and the object non-extensible.
    pub fn define_property(&self, key: &str, descriptor: PropertyDescriptor) -> bool {
        let mut slots = self.inner.slots.write();
        let allowed = match slots.get(key) {
            Some(Slot::Data(desc)) => desc.configurable,
            Some(Slot::Reactive(_)) => true,
            None => self.is_extensible(),
        };
        if allowed {
            slots.insert(key.to_owned(), Slot::Data(descriptor));
        }
        allowed
    }

    /// Remove an own property. Returns false if it was absent or
    /// non-configurable.
    pub fn remove(&self, key: &str) -> bool {
        let mut slots = self.inner.slots.write();
        let removable = match slots.get(key) {
            None => false,
            Some(Slot::Data(desc)) => desc.configurable,
            Some(Slot::Reactive(_)) => true,
        };
        removable && slots.shift_remove(key).is_some()
    }

    pub fn has_own(&self, key: &str) -> bool {
        self.inner.slots.read().contains_key(key)
    }

    /// Whether `key` is backed by a reactive accessor.
    pub fn is_reactive(&self, key: &str) -> bool {
        matches!(self.inner.slots.read().get(key), Some(Slot::Reactive(_)))
    }

    /// Enumerable own keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .slots
            .read()
            .iter()
            .filter(|(_, slot)| match slot {
                Slot::Data(desc) => desc.enumerable,
                Slot::Reactive(_) => true,
            })
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of own properties, enumerable or not.
    pub fn len(&self) -> usize {
        self.inner.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_extensible(&self) -> bool {
        self.inner.extensible.load(Ordering::SeqCst)
    }

    /// Refuse new properties from now on.
    pub fn prevent_extensions(&self) {
        self.inner.extensible.store(false, Ordering::SeqCst);
    }

    /// Refuse new properties and lock every plain property in place.
    pub fn freeze(&self) {
        self.prevent_extensions();
        for slot in self.inner.slots.write().values_mut() {
            if let Slot::Data(desc) = slot {
                desc.configurable = false;
                desc.writable = false;
            }
        }
    }

    /// The observer attached to this object, if any.
    pub fn observer(&self) -> Option<Arc<Observer>> {
        self.inner.observer.get().cloned()
    }

    /// Whether two handles refer to the same object.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    pub(crate) fn slot(&self, key: &str) -> Option<Slot> {
        self.inner.slots.read().get(key).cloned()
    }

    pub(crate) fn install_reactive(&self, key: &str, prop: Arc<ReactiveProperty>) {
        self.inner
            .slots
            .write()
            .insert(key.to_owned(), Slot::Reactive(prop));
    }

    /// Attach `observer` unless one is already attached. Returns the attached one.
    pub(crate) fn attach_observer(&self, observer: Arc<Observer>) -> Arc<Observer> {
        self.inner.observer.get_or_init(|| observer).clone()
    }

    pub(crate) fn downgrade(&self) -> std::sync::Weak<ObjectInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn from_inner(inner: Arc<ObjectInner>) -> Self {
        Self { inner }
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for Object
where
    K: AsRef<str>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let obj = Object::new();
        for (key, value) in iter {
            obj.set(key.as_ref(), value);
        }
        obj
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("kind", &self.inner.kind)
            .field("keys", &self.keys())
            .field("observed", &self.inner.observer.get().is_some())
            .finish()
    }
}
