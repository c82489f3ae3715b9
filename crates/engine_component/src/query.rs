//! Live queries over component membership.
//!
//! A [`QueryManager`] is built from a fixed list of components. Each one is
//! registered together with its negation, and only registered terms may
//! appear in a query.
//!
//! [`QueryResults`] is the AND of its terms, kept up to date incrementally:
//! every add or remove on any term re-checks only the touched entity against
//! all terms, so each membership change costs O(terms).
//!
//! ## Lifetime
//!
//! Results observe their terms until [`QueryResults::dispose`] is called or
//! the last handle is dropped. After that they keep their final membership
//! but stop updating.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::collection::{
    Iter, ObservableCollection, ObservableSet, Observer, Subscription, observer,
};
use crate::entity::Entity;
use crate::error::ComponentError;
use crate::registry::Registry;
use crate::term::{AsTerm, Term};

/// Validates query terms against the registered set and builds results.
#[derive(Debug, Clone)]
pub struct QueryManager {
    registered: Vec<Term>,
}

impl QueryManager {
    /// Register `components`, plus the negation of each as produced by
    /// `registry`.
    pub fn new<I>(registry: &Registry, components: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsTerm,
    {
        let mut registered = Vec::new();
        for component in components {
            let term = component.as_term();
            let negation = registry.not(&term);
            registered.push(term);
            registered.push(negation);
        }
        debug!(terms = registered.len(), "query manager created");
        Self { registered }
    }

    /// Returns `true` if `term` may appear in a query.
    #[must_use]
    pub fn is_registered(&self, term: &Term) -> bool {
        self.registered.contains(term)
    }

    /// Every registered term, each component followed by its negation.
    #[must_use]
    pub fn registered(&self) -> &[Term] {
        &self.registered
    }

    /// Build live results for the AND of `terms`.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentError::Unregistered`] naming the first term that was
    /// not registered. Nothing is subscribed in that case.
    pub fn query(&self, terms: &[Term]) -> Result<QueryResults, ComponentError> {
        if let Some(term) = terms.iter().find(|term| !self.is_registered(term)) {
            return Err(ComponentError::Unregistered { term: term.name() });
        }
        Ok(QueryResults::new(terms.to_vec()))
    }
}

struct QueryInner {
    terms: Vec<Term>,
    entities: ObservableCollection<Entity>,
    subscriptions: RefCell<Vec<Subscription>>,
    disposed: Cell<bool>,
}

impl QueryInner {
    fn matches(&self, entity: &Entity) -> bool {
        self.terms.iter().all(|term| term.has(entity))
    }

    fn on_term_added(&self, entity: &Entity) {
        if self.matches(entity) && self.entities.add(entity.clone()) {
            trace!(query = %self.entities.label(), %entity, "entity included");
        }
    }

    fn on_term_removed(&self, entity: &Entity) {
        if !self.matches(entity) && self.entities.remove(entity) {
            trace!(query = %self.entities.label(), %entity, "entity excluded");
        }
    }
}

/// Live, incrementally maintained AND of several terms.
///
/// Cloning yields another handle to the same results.
#[derive(Clone)]
pub struct QueryResults {
    inner: Rc<QueryInner>,
}

impl QueryResults {
    fn new(terms: Vec<Term>) -> Self {
        let names: Vec<String> = terms.iter().map(Term::name).collect();
        let label = format!("Query[{}]", names.join(", "));
        debug!(query = %label, "query created");

        let inner = Rc::new(QueryInner {
            terms,
            entities: ObservableCollection::with_label(label),
            subscriptions: RefCell::new(Vec::new()),
            disposed: Cell::new(false),
        });

        let mut subscriptions = Vec::with_capacity(inner.terms.len() * 2);
        for term in &inner.terms {
            subscriptions.push(term.stream(Self::forward(&inner, QueryInner::on_term_added)));
            subscriptions.push(term.on_remove(Self::forward(&inner, QueryInner::on_term_removed)));
        }
        *inner.subscriptions.borrow_mut() = subscriptions;

        Self { inner }
    }

    /// An observer that calls `handler` on the query while it is alive.
    fn forward(inner: &Rc<QueryInner>, handler: fn(&QueryInner, &Entity)) -> Observer<Entity> {
        let weak: Weak<QueryInner> = Rc::downgrade(inner);
        observer(move |entity: &Entity| {
            if let Some(inner) = weak.upgrade() {
                handler(&inner, entity);
            }
        })
    }

    /// Stop observing the terms. Membership is frozen from here on.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        let subscriptions = std::mem::take(&mut *self.inner.subscriptions.borrow_mut());
        drop(subscriptions);
        debug!(query = %self.inner.entities.label(), "query disposed");
    }

    /// Returns `true` once [`QueryResults::dispose`] has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// The terms, in the order given to the query.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.inner.terms
    }

    /// Number of entities currently included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entities.len()
    }

    /// Returns `true` if no entity is included.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entities.is_empty()
    }

    /// Iterate the included entities in inclusion order.
    #[must_use]
    pub fn iter(&self) -> Iter<Entity> {
        self.inner.entities.iter()
    }
}

impl ObservableSet<Entity> for QueryResults {
    /// Evaluates every term directly.
    fn has(&self, entity: &Entity) -> bool {
        self.inner.matches(entity)
    }

    fn on_add(&self, observer: Observer<Entity>) -> Subscription {
        self.inner.entities.on_add(observer)
    }

    fn on_remove(&self, observer: Observer<Entity>) -> Subscription {
        self.inner.entities.on_remove(observer)
    }

    fn stream(&self, observer: Observer<Entity>) -> Subscription {
        self.inner.entities.stream(observer)
    }
}

impl IntoIterator for &QueryResults {
    type Item = Entity;
    type IntoIter = Iter<Entity>;

    fn into_iter(self) -> Iter<Entity> {
        self.iter()
    }
}

impl std::fmt::Display for QueryResults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner.entities.label())
    }
}

impl std::fmt::Debug for QueryResults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryResults")
            .field("terms", &self.inner.terms)
            .field("len", &self.len())
            .finish()
    }
}
