#![forbid(unsafe_code)]

//! Per-instance publish/subscribe channels.
//!
//! Every notifying object (cells, view-models, commands) owns one
//! [`EventChannel`] per event kind. Subscribers are stored as `Weak` function
//! pointers; the strong reference lives in the [`Subscription`] returned to the
//! caller, so dropping the guard unsubscribes.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. A subscription dropped before `emit` is never called by that `emit`.
//! 3. No internal borrow is held while a callback runs, so callbacks may
//!    subscribe, emit or drop subscriptions re-entrantly.
//! 4. Dead entries are pruned lazily during `emit` and `subscriber_count`.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<E> = dyn Fn(&E);

/// RAII guard keeping a subscriber callback alive.
///
/// Dropping the guard removes the callback before the next notification.
#[must_use = "dropping a Subscription immediately unsubscribes"]
pub struct Subscription {
    _callback: Box<dyn Any>,
}

impl Subscription {
    fn new<E: 'static>(callback: Rc<Callback<E>>) -> Self {
        Self {
            _callback: Box::new(callback),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

/// A fan-out channel delivering `&E` to zero or more subscribers.
pub struct EventChannel<E> {
    subscribers: RefCell<Vec<Weak<Callback<E>>>>,
}

impl<E> Default for EventChannel<E> {
    fn default() -> Self {
        Self {
            subscribers: RefCell::new(Vec::new()),
        }
    }
}

impl<E> fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("subscribers", &self.subscribers.borrow().len())
            .finish()
    }
}

impl<E: 'static> EventChannel<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. It stays registered while the returned guard lives.
    pub fn subscribe(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        let strong: Rc<Callback<E>> = Rc::new(callback);
        self.subscribers.borrow_mut().push(Rc::downgrade(&strong));
        Subscription::new(strong)
    }

    /// Deliver `event` to every live subscriber.
    pub fn emit(&self, event: &E) {
        let live: Vec<Rc<Callback<E>>> = {
            let mut subs = self.subscribers.borrow_mut();
            subs.retain(|weak| weak.strong_count() > 0);
            subs.iter().filter_map(Weak::upgrade).collect()
        };
        for callback in live {
            callback(event);
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut subs = self.subscribers.borrow_mut();
        subs.retain(|weak| weak.strong_count() > 0);
        subs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn delivers_in_registration_order() {
        let channel = EventChannel::<u32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l1 = Rc::clone(&log);
        let _s1 = channel.subscribe(move |v| l1.borrow_mut().push(("a", *v)));
        let l2 = Rc::clone(&log);
        let _s2 = channel.subscribe(move |v| l2.borrow_mut().push(("b", *v)));

        channel.emit(&7);
        assert_eq!(*log.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let channel = EventChannel::<()>::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let sub = channel.subscribe(move |_| h.set(h.get() + 1));

        channel.emit(&());
        drop(sub);
        channel.emit(&());

        assert_eq!(hits.get(), 1);
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn reentrant_subscribe_during_emit() {
        let channel = Rc::new(EventChannel::<()>::new());
        let extra = Rc::new(RefCell::new(Vec::new()));

        let ch = Rc::clone(&channel);
        let ex = Rc::clone(&extra);
        let _sub = channel.subscribe(move |_| {
            ex.borrow_mut().push(ch.subscribe(|_| {}));
        });

        channel.emit(&());
        assert_eq!(channel.subscriber_count(), 2);
    }

    #[test]
    fn emit_with_no_subscribers_is_noop() {
        let channel = EventChannel::<String>::new();
        channel.emit(&"nobody".to_string());
        assert_eq!(channel.subscriber_count(), 0);
    }
}
