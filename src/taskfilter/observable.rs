//! Single-threaded observable values.
//!
//! [`Observable`] is a shared cell: clones point at the same value, so a
//! filter's `enabled` flag and the option that backs it stay in sync. Setting
//! a different value notifies subscribers synchronously, in the order they
//! subscribed. [`ReadOnly`] wraps an observable for consumers that may watch
//! it but never write it.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered callbacks that may be added or removed while they are running.
///
/// Dispatch detaches the list, so callbacks added during a dispatch first run
/// on the next one. A callback removed during a dispatch does not run again,
/// not even later in the same dispatch.
pub(crate) struct Listeners<F: ?Sized> {
    entries: RefCell<Vec<(u64, Box<F>)>>,
    next_id: Cell<u64>,
    // ids of detached entries, and the ones among them removed mid-dispatch
    in_flight: RefCell<Vec<u64>>,
    removed: RefCell<Vec<u64>>,
}

impl<F: ?Sized> Default for Listeners<F> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            in_flight: RefCell::new(Vec::new()),
            removed: RefCell::new(Vec::new()),
        }
    }
}

impl<F: ?Sized> Listeners<F> {
    pub(crate) fn add(&self, listener: Box<F>) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().push((id, listener));
        id
    }

    pub(crate) fn remove(&self, id: u64) -> bool {
        let removed_now = {
            let mut entries = self.entries.borrow_mut();
            let before = entries.len();
            entries.retain(|(eid, _)| *eid != id);
            entries.len() != before
        };
        if removed_now {
            return true;
        }
        if self.in_flight.borrow().contains(&id) && !self.removed.borrow().contains(&id) {
            self.removed.borrow_mut().push(id);
            return true;
        }
        false
    }

    pub(crate) fn dispatch(&self, mut call: impl FnMut(&mut F)) {
        let mut running = std::mem::take(&mut *self.entries.borrow_mut());
        let ids: Vec<u64> = running.iter().map(|(id, _)| *id).collect();
        self.in_flight.borrow_mut().extend(ids.iter().copied());

        for (id, listener) in running.iter_mut() {
            if self.removed.borrow().contains(id) {
                continue;
            }
            call(&mut **listener);
        }

        self.in_flight.borrow_mut().retain(|id| !ids.contains(id));
        {
            let mut removed = self.removed.borrow_mut();
            running.retain(|(id, _)| !removed.contains(id));
            removed.retain(|id| !ids.contains(id));
        }
        let mut entries = self.entries.borrow_mut();
        let added = std::mem::replace(&mut *entries, running);
        entries.extend(added);
    }
}

struct Inner<T> {
    value: RefCell<T>,
    subscribers: Listeners<dyn FnMut(&T)>,
}

pub struct Observable<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(value),
                subscribers: Listeners::default(),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Stores `value`; subscribers run only if it differs from the current one.
    pub fn set(&self, value: T) {
        {
            let mut current = self.inner.value.borrow_mut();
            if *current == value {
                return;
            }
            *current = value.clone();
        }
        self.inner.subscribers.dispatch(|subscriber| subscriber(&value));
    }

    pub fn subscribe(&self, subscriber: impl FnMut(&T) + 'static) -> SubscriptionId {
        SubscriptionId(self.inner.subscribers.add(Box::new(subscriber)))
    }

    /// Stops notifications to `id`, also when called from a subscriber.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.remove(id.0)
    }

    /// True when both handles share the same cell.
    pub fn same_as(&self, other: &Observable<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn read_only(&self) -> ReadOnly<T> {
        ReadOnly(self.clone())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Observable")
            .field(&*self.inner.value.borrow())
            .finish()
    }
}

/// Watch-only view of an [`Observable`].
#[derive(Clone)]
pub struct ReadOnly<T>(Observable<T>);

impl<T: Clone + PartialEq + 'static> ReadOnly<T> {
    pub fn get(&self) -> T {
        self.0.get()
    }

    pub fn subscribe(&self, subscriber: impl FnMut(&T) + 'static) -> SubscriptionId {
        self.0.subscribe(subscriber)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.0.unsubscribe(id)
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadOnly<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadOnly").field(&self.0).finish()
    }
}
