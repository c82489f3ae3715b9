//! Complement view over an observable collection.

use std::hash::Hash;

use crate::collection::{
    ObservableSet, Observer, ReadonlyCollection, SetLike, Subscription, WeakCollection,
};
use crate::error::ComponentError;

/// A read-only view whose membership is the complement of a base collection.
///
/// The view has no storage of its own and does not keep the base alive. Its
/// add events are the base's remove events and vice versa. Once the base is
/// dropped, nothing is a member of the base, so everything is a member of the
/// view and no further events arrive.
///
/// The complement of a finite set is unbounded, so [`ObservableSet::stream`]
/// replays nothing and only delivers future additions (base removals). Query
/// results intersect it with a positive term to get a finite answer.
pub struct InverseCollection<T> {
    base: WeakCollection<T>,
    label: String,
}

impl<T: Clone + Eq + Hash + 'static> InverseCollection<T> {
    /// Create the complement view of `base`.
    #[must_use]
    pub fn new(base: &ReadonlyCollection<T>) -> Self {
        Self {
            base: base.downgrade(),
            label: format!("Not({})", base.label()),
        }
    }

    /// The diagnostic label, `Not(<base label>)`.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns `true` while the base collection is still alive.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.base.upgrade().is_some()
    }
}

impl<T> Clone for InverseCollection<T> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            label: self.label.clone(),
        }
    }
}

impl<T: Clone + Eq + Hash + 'static> ObservableSet<T> for InverseCollection<T> {
    fn has(&self, item: &T) -> bool {
        self.base.upgrade().is_none_or(|base| !base.has(item))
    }

    fn on_add(&self, observer: Observer<T>) -> Subscription {
        match self.base.upgrade() {
            Some(base) => base.on_remove(observer),
            None => Subscription::inert(),
        }
    }

    fn on_remove(&self, observer: Observer<T>) -> Subscription {
        match self.base.upgrade() {
            Some(base) => base.on_add(observer),
            None => Subscription::inert(),
        }
    }

    fn stream(&self, observer: Observer<T>) -> Subscription {
        self.on_add(observer)
    }
}

impl<T: Clone + Eq + Hash + 'static> SetLike<T> for InverseCollection<T> {
    fn insert(&self, _item: T) -> Result<bool, ComponentError> {
        Err(ComponentError::ReadOnly {
            collection: self.label.clone(),
        })
    }

    fn delete(&self, _item: &T) -> Result<bool, ComponentError> {
        Err(ComponentError::ReadOnly {
            collection: self.label.clone(),
        })
    }
}

impl<T> std::fmt::Debug for InverseCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InverseCollection")
            .field("label", &self.label)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::collection::{ObservableCollection, observer};

    #[test]
    fn test_membership_is_complement() {
        let base = ObservableCollection::with_label("Velocity");
        let inverse = InverseCollection::new(&base.readonly());
        assert_eq!(inverse.label(), "Not(Velocity)");

        assert!(inverse.has(&1));
        base.add(1);
        assert!(!inverse.has(&1));
        base.remove(&1);
        assert!(inverse.has(&1));
    }

    #[test]
    fn test_events_are_swapped() {
        let base = ObservableCollection::new();
        let inverse = InverseCollection::new(&base.readonly());
        let log = Rc::new(RefCell::new(Vec::new()));

        let added = Rc::clone(&log);
        let _a = inverse.on_add(observer(move |item: &u32| {
            added.borrow_mut().push(("add", *item));
        }));
        let removed = Rc::clone(&log);
        let _r = inverse.on_remove(observer(move |item: &u32| {
            removed.borrow_mut().push(("remove", *item));
        }));

        base.add(4);
        base.add(4);
        base.remove(&4);
        assert_eq!(*log.borrow(), vec![("remove", 4), ("add", 4)]);
    }

    #[test]
    fn test_stream_only_delivers_future_additions() {
        let base = ObservableCollection::new();
        base.add(1);
        let inverse = InverseCollection::new(&base.readonly());
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        let _sub = inverse.stream(observer(move |item: &u32| sink.borrow_mut().push(*item)));

        assert!(calls.borrow().is_empty());
        base.remove(&1);
        assert_eq!(*calls.borrow(), vec![1]);
    }

    #[test]
    fn test_does_not_keep_base_alive() {
        let base = ObservableCollection::new();
        base.add(1);
        let inverse = InverseCollection::new(&base.readonly());
        assert!(inverse.is_attached());
        drop(base);
        assert!(!inverse.is_attached());
        assert!(inverse.has(&1));
        inverse.on_add(observer(|_: &u32| {})).unsubscribe();
    }

    #[test]
    fn test_rejects_mutation() {
        let base = ObservableCollection::with_label("Sprite");
        let inverse = InverseCollection::new(&base.readonly());
        assert!(matches!(
            inverse.insert(1),
            Err(ComponentError::ReadOnly { collection }) if collection == "Not(Sprite)"
        ));
    }
}
