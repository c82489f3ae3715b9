//! Observable membership sets.
//!
//! An [`ObservableCollection`] is an insertion-ordered set that notifies
//! observers synchronously on every membership change. A
//! [`ReadonlyCollection`] is a shared view of the same set without write
//! access; components hand those out so membership can only change through
//! the component itself.
//!
//! ## Dispatch
//!
//! Observers run in registration order. Before calling anything, dispatch
//! takes a snapshot of the observer list and releases every internal borrow,
//! so an observer may freely add to or remove from this or any other
//! collection. Nested changes dispatch immediately. Observers registered
//! during a dispatch first see the next event; observers detached during a
//! dispatch are skipped for the rest of it.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::rc::{Rc, Weak};

use crate::error::ComponentError;

/// A callback invoked with a collection member.
pub type Observer<T> = Rc<dyn Fn(&T)>;

/// Wrap a closure as an [`Observer`].
pub fn observer<T, F>(f: F) -> Observer<T>
where
    F: Fn(&T) + 'static,
{
    Rc::new(f)
}

/// Read contract shared by every membership set: collections, inverse views,
/// component membership, and query results.
pub trait ObservableSet<T> {
    /// Returns `true` if `item` is currently a member.
    fn has(&self, item: &T) -> bool;

    /// Call `observer` for every future addition.
    fn on_add(&self, observer: Observer<T>) -> Subscription;

    /// Call `observer` for every future removal.
    fn on_remove(&self, observer: Observer<T>) -> Subscription;

    /// Call `observer` once for each current member, in insertion order, then
    /// for every future addition. No member is delivered twice.
    fn stream(&self, observer: Observer<T>) -> Subscription;
}

/// Generic set-style mutation. Owned collections accept it; read-only views
/// reject it with [`ComponentError::ReadOnly`].
pub trait SetLike<T> {
    /// Insert `item`. `Ok(false)` if it was already a member.
    fn insert(&self, item: T) -> Result<bool, ComponentError>;

    /// Delete `item`. `Ok(false)` if it was not a member.
    fn delete(&self, item: &T) -> Result<bool, ComponentError>;
}

/// Handle to a registered observer.
///
/// Dropping the handle or calling [`Subscription::unsubscribe`] detaches the
/// observer. Call [`Subscription::detach`] to keep the observer for as long as
/// the collection lives.
#[must_use = "dropping a Subscription detaches its observer"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to detach, returned when the source
    /// collection no longer exists.
    pub(crate) fn inert() -> Self {
        Self { cancel: None }
    }

    /// Detach the observer now.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Keep the observer registered for the lifetime of the collection.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.cancel.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy)]
enum Event {
    Add,
    Remove,
}

struct Slot<T> {
    active: Cell<bool>,
    observer: Observer<T>,
}

struct State<T> {
    label: String,
    /// Member -> insertion sequence number.
    members: HashMap<T, u64>,
    /// Insertion sequence number -> member, for ordered iteration.
    order: BTreeMap<u64, T>,
    next_seq: u64,
    on_add: Vec<Rc<Slot<T>>>,
    on_remove: Vec<Rc<Slot<T>>>,
}

impl<T> State<T> {
    fn observers_mut(&mut self, event: Event) -> &mut Vec<Rc<Slot<T>>> {
        match event {
            Event::Add => &mut self.on_add,
            Event::Remove => &mut self.on_remove,
        }
    }
}

/// Shared state plus the operations both the owner and read-only views need.
struct Core<T>(Rc<RefCell<State<T>>>);

impl<T> Clone for Core<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: Clone + Eq + Hash + 'static> Core<T> {
    fn new(label: String) -> Self {
        Self(Rc::new(RefCell::new(State {
            label,
            members: HashMap::new(),
            order: BTreeMap::new(),
            next_seq: 0,
            on_add: Vec::new(),
            on_remove: Vec::new(),
        })))
    }

    fn label(&self) -> String {
        self.0.borrow().label.clone()
    }

    fn has(&self, item: &T) -> bool {
        self.0.borrow().members.contains_key(item)
    }

    fn seq_of(&self, item: &T) -> Option<u64> {
        self.0.borrow().members.get(item).copied()
    }

    fn len(&self) -> usize {
        self.0.borrow().members.len()
    }

    #[cfg(test)]
    fn observer_count(&self) -> usize {
        let state = self.0.borrow();
        state
            .on_add
            .iter()
            .chain(&state.on_remove)
            .filter(|slot| slot.active.get())
            .count()
    }

    fn iter(&self) -> Iter<T> {
        Iter {
            state: Rc::clone(&self.0),
            cursor: 0,
        }
    }

    fn insert(&self, item: T) -> bool {
        {
            let mut state = self.0.borrow_mut();
            if state.members.contains_key(&item) {
                return false;
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            state.members.insert(item.clone(), seq);
            state.order.insert(seq, item.clone());
        }
        self.dispatch(Event::Add, &item);
        true
    }

    fn delete(&self, item: &T) -> bool {
        {
            let mut state = self.0.borrow_mut();
            let Some(seq) = state.members.remove(item) else {
                return false;
            };
            state.order.remove(&seq);
        }
        self.dispatch(Event::Remove, item);
        true
    }

    fn dispatch(&self, event: Event, item: &T) {
        let snapshot = self.0.borrow_mut().observers_mut(event).clone();
        for slot in snapshot {
            if slot.active.get() {
                (slot.observer)(item);
            }
        }
    }

    fn subscribe(&self, event: Event, observer: Observer<T>) -> Subscription {
        let slot = Rc::new(Slot {
            active: Cell::new(true),
            observer,
        });
        self.0
            .borrow_mut()
            .observers_mut(event)
            .push(Rc::clone(&slot));

        let weak = Rc::downgrade(&self.0);
        Subscription::new(move || {
            slot.active.set(false);
            if let Some(shared) = weak.upgrade()
                && let Ok(mut state) = shared.try_borrow_mut()
            {
                state
                    .observers_mut(event)
                    .retain(|other| !Rc::ptr_eq(other, &slot));
            }
        })
    }

    fn stream(&self, observer: Observer<T>) -> Subscription {
        let snapshot: Vec<(u64, T)> = self
            .0
            .borrow()
            .order
            .iter()
            .map(|(&seq, item)| (seq, item.clone()))
            .collect();
        let subscription = self.subscribe(Event::Add, Rc::clone(&observer));
        for (seq, item) in snapshot {
            // Skip members removed (or removed and re-added) during replay.
            if self.seq_of(&item) == Some(seq) {
                observer(&item);
            }
        }
        subscription
    }
}

/// Lazy iterator over the current members in insertion order.
///
/// Holds no borrow between steps, so the collection may change while it is
/// being iterated; members added meanwhile are yielded, members removed
/// before they are reached are not.
pub struct Iter<T> {
    state: Rc<RefCell<State<T>>>,
    cursor: u64,
}

impl<T: Clone> Iterator for Iter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let state = self.state.borrow();
        let (&seq, item) = state.order.range(self.cursor..).next()?;
        self.cursor = seq + 1;
        Some(item.clone())
    }
}

/// An owned, mutable, observable set.
pub struct ObservableCollection<T> {
    core: Core<T>,
}

impl<T: Clone + Eq + Hash + 'static> ObservableCollection<T> {
    /// Create an empty, unlabelled collection.
    #[must_use]
    pub fn new() -> Self {
        Self::with_label("collection")
    }

    /// Create an empty collection with a diagnostic label.
    #[must_use]
    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            core: Core::new(label.into()),
        }
    }

    /// Insert `item` and notify add-observers. Returns `false`, without
    /// notifying anyone, if it was already a member.
    pub fn add(&self, item: T) -> bool {
        self.core.insert(item)
    }

    /// Remove `item` and notify remove-observers. Returns `false`, without
    /// notifying anyone, if it was not a member.
    pub fn remove(&self, item: &T) -> bool {
        self.core.delete(item)
    }

    /// A read-only view sharing this collection's state.
    #[must_use]
    pub fn readonly(&self) -> ReadonlyCollection<T> {
        ReadonlyCollection {
            core: self.core.clone(),
        }
    }

    /// The diagnostic label.
    #[must_use]
    pub fn label(&self) -> String {
        self.core.label()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.core.len()
    }

    /// Returns `true` if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the current members in insertion order.
    #[must_use]
    pub fn iter(&self) -> Iter<T> {
        self.core.iter()
    }
}

impl<T: Clone + Eq + Hash + 'static> Default for ObservableCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Eq + Hash + 'static> ObservableSet<T> for ObservableCollection<T> {
    fn has(&self, item: &T) -> bool {
        self.core.has(item)
    }

    fn on_add(&self, observer: Observer<T>) -> Subscription {
        self.core.subscribe(Event::Add, observer)
    }

    fn on_remove(&self, observer: Observer<T>) -> Subscription {
        self.core.subscribe(Event::Remove, observer)
    }

    fn stream(&self, observer: Observer<T>) -> Subscription {
        self.core.stream(observer)
    }
}

impl<T: Clone + Eq + Hash + 'static> SetLike<T> for ObservableCollection<T> {
    fn insert(&self, item: T) -> Result<bool, ComponentError> {
        Ok(self.add(item))
    }

    fn delete(&self, item: &T) -> Result<bool, ComponentError> {
        Ok(self.remove(item))
    }
}

impl<T: Clone + Eq + Hash + 'static> IntoIterator for &ObservableCollection<T> {
    type Item = T;
    type IntoIter = Iter<T>;

    fn into_iter(self) -> Iter<T> {
        self.iter()
    }
}

impl<T> std::fmt::Debug for ObservableCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.core.0.borrow();
        f.debug_struct("ObservableCollection")
            .field("label", &state.label)
            .field("len", &state.members.len())
            .finish()
    }
}

/// A read-only view of an [`ObservableCollection`].
pub struct ReadonlyCollection<T> {
    core: Core<T>,
}

impl<T> Clone for ReadonlyCollection<T> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T: Clone + Eq + Hash + 'static> ReadonlyCollection<T> {
    /// The diagnostic label.
    #[must_use]
    pub fn label(&self) -> String {
        self.core.label()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.core.len()
    }

    /// Returns `true` if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the current members in insertion order.
    #[must_use]
    pub fn iter(&self) -> Iter<T> {
        self.core.iter()
    }

    /// Live add and remove observers.
    #[cfg(test)]
    pub(crate) fn observer_count(&self) -> usize {
        self.core.observer_count()
    }

    pub(crate) fn downgrade(&self) -> WeakCollection<T> {
        WeakCollection(Rc::downgrade(&self.core.0))
    }
}

impl<T: Clone + Eq + Hash + 'static> ObservableSet<T> for ReadonlyCollection<T> {
    fn has(&self, item: &T) -> bool {
        self.core.has(item)
    }

    fn on_add(&self, observer: Observer<T>) -> Subscription {
        self.core.subscribe(Event::Add, observer)
    }

    fn on_remove(&self, observer: Observer<T>) -> Subscription {
        self.core.subscribe(Event::Remove, observer)
    }

    fn stream(&self, observer: Observer<T>) -> Subscription {
        self.core.stream(observer)
    }
}

impl<T: Clone + Eq + Hash + 'static> SetLike<T> for ReadonlyCollection<T> {
    fn insert(&self, _item: T) -> Result<bool, ComponentError> {
        Err(ComponentError::ReadOnly {
            collection: self.label(),
        })
    }

    fn delete(&self, _item: &T) -> Result<bool, ComponentError> {
        Err(ComponentError::ReadOnly {
            collection: self.label(),
        })
    }
}

impl<T: Clone + Eq + Hash + 'static> IntoIterator for &ReadonlyCollection<T> {
    type Item = T;
    type IntoIter = Iter<T>;

    fn into_iter(self) -> Iter<T> {
        self.iter()
    }
}

impl<T> std::fmt::Debug for ReadonlyCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.core.0.borrow();
        f.debug_struct("ReadonlyCollection")
            .field("label", &state.label)
            .field("len", &state.members.len())
            .finish()
    }
}

/// Non-owning reference to a collection.
pub(crate) struct WeakCollection<T>(Weak<RefCell<State<T>>>);

impl<T> Clone for WeakCollection<T> {
    fn clone(&self) -> Self {
        Self(Weak::clone(&self.0))
    }
}

impl<T: Clone + Eq + Hash + 'static> WeakCollection<T> {
    pub(crate) fn upgrade(&self) -> Option<ReadonlyCollection<T>> {
        self.0.upgrade().map(|state| ReadonlyCollection { core: Core(state) })
    }
}
