#![forbid(unsafe_code)]

//! Named, change-notifying value cells.
//!
//! An [`ObservableCell<T>`] backs one logical property of a view-model. Setting
//! a different value bumps the cell's version and notifies subscribers with the
//! cell's [`PropertyName`]. Setting an equal value does nothing.
//!
//! Cloning a cell creates another handle to the same storage.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::event::{EventChannel, Subscription};
use crate::property::PropertyName;

use super::Tracked;

struct CellInner<T> {
    value: T,
    version: u64,
}

/// A mutable, observable value container bound to a property name.
pub struct ObservableCell<T> {
    name: PropertyName,
    inner: Rc<RefCell<CellInner<T>>>,
    changed: Rc<EventChannel<PropertyName>>,
}

impl<T> Clone for ObservableCell<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            inner: Rc::clone(&self.inner),
            changed: Rc::clone(&self.changed),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ObservableCell")
            .field("name", &self.name)
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> ObservableCell<T> {
    /// Create a detached cell. View-models normally obtain cells from
    /// [`ViewModelBuilder::backing`](crate::ViewModelBuilder::backing).
    #[must_use]
    pub fn new(name: PropertyName, initial: T) -> Self {
        Self {
            name,
            inner: Rc::new(RefCell::new(CellInner {
                value: initial,
                version: 0,
            })),
            changed: Rc::new(EventChannel::new()),
        }
    }

    /// Property this cell backs.
    #[must_use]
    pub fn name(&self) -> PropertyName {
        self.name
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Borrow the current value.
    ///
    /// # Panics
    ///
    /// Panics if `f` calls [`set`](Self::set) on the same cell.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value. Subscribers are notified only when `value` differs
    /// from the current value. Returns whether the value changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return false;
            }
            inner.value = value;
            inner.version += 1;
        }
        tracing::trace!(message = "cell.set", property = %self.name);
        self.changed.emit(&self.name);
        true
    }

    /// Apply `f` to a copy of the value and store the result.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }

    /// Number of effective mutations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Listen for changes. The callback receives the cell's property name.
    pub fn subscribe(&self, callback: impl Fn(&PropertyName) + 'static) -> Subscription {
        self.changed.subscribe(callback)
    }

    /// Live subscriber count.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.changed.subscriber_count()
    }
}

impl<T: Clone + PartialEq + 'static> Tracked for ObservableCell<T> {
    fn version(&self) -> u64 {
        ObservableCell::version(self)
    }
}
