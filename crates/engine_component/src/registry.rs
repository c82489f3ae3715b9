//! Component registry.
//!
//! A [`Registry`] is the session object components are defined through. It
//! carries the [`RegistryConfig`] every definition copies, and it memoises
//! negations so that `not(C)` returns the same [`Term`] on every call. The
//! memo is scoped to the registry; independent registries never share
//! entries.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Weak;

use tracing::debug;

use crate::component::{ComponentDefinition, Serializable, Shape};
use crate::config::RegistryConfig;
use crate::query::QueryManager;
use crate::term::{AsTerm, QueryTerm, Term, TermId, negate};

struct CachedNegation {
    source: Weak<dyn QueryTerm>,
    term: Term,
}

/// Defines components and hands out memoised negations.
pub struct Registry {
    config: RegistryConfig,
    negations: RefCell<HashMap<TermId, CachedNegation>>,
}

impl Registry {
    /// Create a registry with the given configuration.
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            negations: RefCell::new(HashMap::new()),
        }
    }

    /// The configuration components defined here inherit.
    #[must_use]
    pub fn config(&self) -> RegistryConfig {
        self.config
    }

    /// Define a component for shape `S` without serialisation hooks.
    #[must_use]
    pub fn define<S: Shape>(&self) -> ComponentDefinition<S> {
        ComponentDefinition::new(self.config)
    }

    /// Define a component for shape `S` using its [`Serializable`] hooks.
    #[must_use]
    pub fn define_serializable<S: Serializable>(&self) -> ComponentDefinition<S, S::Data> {
        ComponentDefinition::serializable(self.config)
    }

    /// The negation of `term`.
    ///
    /// Repeated calls with the same term return the same negation. Negating a
    /// negation returns the original term while it is alive.
    pub fn not(&self, term: &impl AsTerm) -> Term {
        let term = term.as_term();
        if let Some(source) = term.negated() {
            return source;
        }
        let Some(members) = term.members() else {
            // A negation whose source is gone; nothing left to flip back to.
            return term;
        };

        let mut negations = self.negations.borrow_mut();
        negations.retain(|_, cached| cached.source.strong_count() > 0);
        let cached = negations.entry(term.id()).or_insert_with(|| {
            debug!(term = %term, "negation created");
            CachedNegation {
                source: term.downgrade(),
                term: negate(&term, &members),
            }
        });
        cached.term.clone()
    }

    /// Number of live memoised negations.
    #[must_use]
    pub fn negation_count(&self) -> usize {
        self.negations
            .borrow()
            .values()
            .filter(|cached| cached.source.strong_count() > 0)
            .count()
    }

    /// Build a query manager that accepts `components` and their negations.
    pub fn query_manager<I>(&self, components: I) -> QueryManager
    where
        I: IntoIterator,
        I::Item: AsTerm,
    {
        QueryManager::new(self, components)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("negations", &self.negation_count())
            .finish()
    }
}
