//! Query terms.
//!
//! A [`Term`] is one AND-clause of a query: either a component's membership or
//! the negation of it. Terms compare by identity ([`TermId`]), which is how
//! the query manager recognises a term as registered.

use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::collection::{ObservableSet, Observer, ReadonlyCollection, Subscription};
use crate::entity::Entity;
use crate::inverse::InverseCollection;

/// Process-unique identity of a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u64);

impl TermId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Implemented by everything that can back a [`Term`].
pub(crate) trait QueryTerm: ObservableSet<Entity> {
    fn term_id(&self) -> TermId;

    fn name(&self) -> String;

    /// The owned membership behind a positive term. `None` for derived terms.
    fn members(&self) -> Option<ReadonlyCollection<Entity>>;

    /// For a negation, the term it negates while that term is alive.
    fn negated(&self) -> Option<Term> {
        None
    }
}

/// A clonable, identity-compared handle to a query term.
#[derive(Clone)]
pub struct Term(Rc<dyn QueryTerm>);

impl Term {
    pub(crate) fn new(inner: Rc<dyn QueryTerm>) -> Self {
        Self(inner)
    }

    /// The term's identity.
    #[must_use]
    pub fn id(&self) -> TermId {
        self.0.term_id()
    }

    /// Diagnostic name, e.g. `Velocity` or `Not(Velocity)`.
    #[must_use]
    pub fn name(&self) -> String {
        self.0.name()
    }

    /// Returns `true` for a negation.
    #[must_use]
    pub fn is_negated(&self) -> bool {
        self.0.members().is_none()
    }

    pub(crate) fn members(&self) -> Option<ReadonlyCollection<Entity>> {
        self.0.members()
    }

    pub(crate) fn negated(&self) -> Option<Term> {
        self.0.negated()
    }

    pub(crate) fn downgrade(&self) -> Weak<dyn QueryTerm> {
        Rc::downgrade(&self.0)
    }
}

impl ObservableSet<Entity> for Term {
    fn has(&self, item: &Entity) -> bool {
        self.0.has(item)
    }

    fn on_add(&self, observer: Observer<Entity>) -> Subscription {
        self.0.on_add(observer)
    }

    fn on_remove(&self, observer: Observer<Entity>) -> Subscription {
        self.0.on_remove(observer)
    }

    fn stream(&self, observer: Observer<Entity>) -> Subscription {
        self.0.stream(observer)
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Term {}

impl std::fmt::Debug for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Term").field(&self.name()).finish()
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

/// Conversion into a [`Term`].
pub trait AsTerm {
    /// The term handle for `self`.
    fn as_term(&self) -> Term;
}

impl AsTerm for Term {
    fn as_term(&self) -> Term {
        self.clone()
    }
}

/// Read-only negation of a positive term, backed by an inverse collection.
struct Negation {
    id: TermId,
    source: Weak<dyn QueryTerm>,
    name: String,
    inverse: InverseCollection<Entity>,
}

impl ObservableSet<Entity> for Negation {
    fn has(&self, item: &Entity) -> bool {
        self.inverse.has(item)
    }

    fn on_add(&self, observer: Observer<Entity>) -> Subscription {
        self.inverse.on_add(observer)
    }

    fn on_remove(&self, observer: Observer<Entity>) -> Subscription {
        self.inverse.on_remove(observer)
    }

    fn stream(&self, observer: Observer<Entity>) -> Subscription {
        self.inverse.stream(observer)
    }
}

impl QueryTerm for Negation {
    fn term_id(&self) -> TermId {
        self.id
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn members(&self) -> Option<ReadonlyCollection<Entity>> {
        None
    }

    fn negated(&self) -> Option<Term> {
        self.source.upgrade().map(Term::new)
    }
}

/// Build a fresh negation of `source`, whose membership is `members`.
pub(crate) fn negate(source: &Term, members: &ReadonlyCollection<Entity>) -> Term {
    Term::new(Rc::new(Negation {
        id: TermId::next(),
        source: source.downgrade(),
        name: format!("Not({})", source.name()),
        inverse: InverseCollection::new(members),
    }))
}
