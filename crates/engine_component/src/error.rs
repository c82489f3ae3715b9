//! Error types for component, collection, and query operations.

/// Errors raised at the point of misuse by component definitions, membership
/// collections, and the query manager.
///
/// All variants describe programmer error. None of them are retried or
/// recovered internally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComponentError {
    /// An entity did not carry the component's shape after `add` while strict
    /// validation was enabled.
    #[error("entity is missing a required property for {component}: {reason}")]
    InvariantViolation {
        /// Diagnostic name of the offending component.
        component: String,
        /// What was found on the entity instead.
        reason: String,
    },

    /// A query named a term that was not registered with the query manager.
    #[error("component not registered: {term}")]
    Unregistered {
        /// Diagnostic name of the offending term.
        term: String,
    },

    /// External code tried to mutate a read-only membership view.
    #[error("cannot mutate read-only collection '{collection}' directly")]
    ReadOnly {
        /// Label of the collection that rejected the mutation.
        collection: String,
    },
}
