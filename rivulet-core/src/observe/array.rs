//! List-like containers.
//!
//! Individual list slots cannot carry their own accessors, so an [`Array`]
//! is reactive as a whole: its in-place mutators are the only way to change
//! it, and once the list is observed each of them
//!
//! 1. performs the operation,
//! 2. observes any elements it inserted,
//! 3. notifies the list observer's dependency node,
//! 4. returns the operation's result unchanged.
//!
//! Reads (`get`, `len`, `to_vec`) are untracked. A consumer depends on a list
//! through the property that holds it.

use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::RwLock;
use tracing::debug;

use super::{Observer, Value};

pub(crate) struct ArrayInner {
    items: RwLock<Vec<Value>>,
    extensible: AtomicBool,
    observer: OnceLock<Arc<Observer>>,
}

/// A shared handle to a list-like container. Cloning shares the list.
#[derive(Clone)]
pub struct Array {
    inner: Arc<ArrayInner>,
}

impl Array {
    pub fn new() -> Self {
        Self::from(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.inner.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.inner.items.read().get(index).cloned()
    }

    /// A copy of the elements. Containers inside are shared, not copied.
    pub fn to_vec(&self) -> Vec<Value> {
        self.inner.items.read().clone()
    }

    /// Append elements. Returns the new length.
    pub fn push<I>(&self, items: I) -> usize
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let inserted: Vec<Value> = items.into_iter().map(Into::into).collect();
        let len = {
            let mut list = self.inner.items.write();
            if self.refuses_growth(&inserted) {
                return list.len();
            }
            list.extend(inserted.iter().cloned());
            list.len()
        };
        self.intercepted(&inserted);
        len
    }

    /// Remove the last element.
    pub fn pop(&self) -> Option<Value> {
        let removed = self.inner.items.write().pop();
        self.intercepted(&[]);
        removed
    }

    /// Remove the first element.
    pub fn shift(&self) -> Option<Value> {
        let removed = {
            let mut list = self.inner.items.write();
            (!list.is_empty()).then(|| list.remove(0))
        };
        self.intercepted(&[]);
        removed
    }

    /// Insert elements at the front, keeping their order. Returns the new length.
    pub fn unshift<I>(&self, items: I) -> usize
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let inserted: Vec<Value> = items.into_iter().map(Into::into).collect();
        let len = {
            let mut list = self.inner.items.write();
            if self.refuses_growth(&inserted) {
                return list.len();
            }
            list.splice(0..0, inserted.iter().cloned());
            list.len()
        };
        self.intercepted(&inserted);
        len
    }

    /// Remove `delete_count` elements at `start` and insert `items` in their
    /// place. Out-of-range bounds are clamped. Returns the removed elements.
    pub fn splice<I>(&self, start: usize, delete_count: usize, items: I) -> Vec<Value>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let inserted: Vec<Value> = items.into_iter().map(Into::into).collect();
        let removed = {
            let mut list = self.inner.items.write();
            let start = start.min(list.len());
            let end = start.saturating_add(delete_count).min(list.len());
            if inserted.len() > end - start && self.refuses_growth(&inserted) {
                return Vec::new();
            }
            list.splice(start..end, inserted.iter().cloned()).collect()
        };
        self.intercepted(&inserted);
        removed
    }

    /// Sort in place with a comparator.
    ///
    /// The comparator sees a copy; the list is unchanged until it returns.
    pub fn sort_by<F>(&self, compare: F)
    where
        F: FnMut(&Value, &Value) -> CmpOrdering,
    {
        let mut items = self.to_vec();
        items.sort_by(compare);
        *self.inner.items.write() = items;
        self.intercepted(&[]);
    }

    /// Sort in place by [`Value::default_cmp`].
    pub fn sort(&self) {
        self.sort_by(Value::default_cmp);
    }

    /// Reverse in place.
    pub fn reverse(&self) {
        self.inner.items.write().reverse();
        self.intercepted(&[]);
    }

    pub fn is_extensible(&self) -> bool {
        self.inner.extensible.load(Ordering::SeqCst)
    }

    /// Refuse growth from now on. Removal, sorting and reversal still work.
    pub fn prevent_extensions(&self) {
        self.inner.extensible.store(false, Ordering::SeqCst);
    }

    /// The observer attached to this list, if any.
    pub fn observer(&self) -> Option<Arc<Observer>> {
        self.inner.observer.get().cloned()
    }

    /// Whether two handles refer to the same list.
    pub fn ptr_eq(&self, other: &Array) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    /// Pad with nulls up to `len`. Not intercepted: no observation, no notify.
    pub(crate) fn extend_to(&self, len: usize) {
        let mut list = self.inner.items.write();
        if list.len() < len && self.is_extensible() {
            list.resize(len, Value::Null);
        }
    }

    pub(crate) fn attach_observer(&self, observer: Arc<Observer>) -> Arc<Observer> {
        self.inner.observer.get_or_init(|| observer).clone()
    }

    pub(crate) fn downgrade(&self) -> Weak<ArrayInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn from_inner(inner: Arc<ArrayInner>) -> Self {
        Self { inner }
    }

    fn refuses_growth(&self, inserted: &[Value]) -> bool {
        let refused = !inserted.is_empty() && !self.is_extensible();
        if refused {
            debug!(count = inserted.len(), "insert into non-extensible list ignored");
        }
        refused
    }

    fn intercepted(&self, inserted: &[Value]) {
        if let Some(observer) = self.observer() {
            if !inserted.is_empty() {
                observer.observe_array(inserted);
            }
            observer.dep().notify();
        }
    }
}

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<Value>> for Array {
    fn from(items: Vec<Value>) -> Self {
        Self {
            inner: Arc::new(ArrayInner {
                items: RwLock::new(items),
                extensible: AtomicBool::new(true),
                observer: OnceLock::new(),
            }),
        }
    }
}

impl<V: Into<Value>> FromIterator<V> for Array {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from(iter.into_iter().map(Into::into).collect::<Vec<_>>())
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Array")
            .field("len", &self.len())
            .field("observed", &self.inner.observer.get().is_some())
            .finish()
    }
}
