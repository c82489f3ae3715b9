//! # engine_component
//!
//! Runtime component composition. Components attach typed state to plain,
//! identity-compared entities, track which entities currently carry them, and
//! feed live queries that stay correct as membership changes.
//!
//! This crate provides:
//!
//! - [`Entity`] / [`EntityAllocator`]: identity handles with a per-entity
//!   sparse component map.
//! - [`ObservableCollection`]: insertion-ordered set with synchronous add and
//!   remove events and replay-then-subscribe streaming.
//! - [`InverseCollection`]: complement view over a collection.
//! - [`ComponentDefinition`]: owner of one [`Shape`]'s membership, with
//!   optional [`Serializable`] hooks.
//! - [`Registry`]: defines components and memoises their negations.
//! - [`QueryManager`] / [`QueryResults`]: incrementally maintained AND of
//!   component and negated-component terms.
//!
//! Everything is single-threaded and synchronous: an operation and every
//! observer it triggers finish before it returns.
//!
//! ## Usage
//!
//! ```rust
//! use engine_component::{EntityAllocator, ObservableSet, Registry, RegistryConfig, Shape};
//!
//! #[derive(Debug, Default)]
//! struct Position { x: f32, y: f32, z: f32 }
//!
//! impl Shape for Position {
//!     fn type_name() -> &'static str { "Position" }
//! }
//!
//! #[derive(Debug, Default)]
//! struct Frozen;
//!
//! impl Shape for Frozen {
//!     fn type_name() -> &'static str { "Frozen" }
//! }
//!
//! let registry = Registry::new(RegistryConfig::default());
//! let positions = registry.define::<Position>();
//! let frozen = registry.define::<Frozen>();
//! let manager = registry.query_manager([positions.term(), frozen.term()]);
//!
//! let movable = manager
//!     .query(&[positions.term(), registry.not(&frozen)])
//!     .unwrap();
//!
//! let entity = EntityAllocator::new().allocate();
//! positions.add(&entity).unwrap();
//! assert!(movable.has(&entity));
//!
//! frozen.add(&entity).unwrap();
//! assert!(movable.is_empty());
//! ```

pub mod collection;
pub mod component;
pub mod config;
pub mod entity;
pub mod error;
pub mod inverse;
pub mod query;
pub mod registry;
pub mod term;

#[cfg(test)]
mod fixtures;

pub use collection::{
    Iter, ObservableCollection, ObservableSet, Observer, ReadonlyCollection, SetLike,
    Subscription, observer,
};
pub use component::{
    ANONYMOUS_COMPONENT, ComponentDefinition, ComponentTypeId, Serializable, Shape,
};
pub use config::RegistryConfig;
pub use entity::{Entity, EntityAllocator};
pub use error::ComponentError;
pub use inverse::InverseCollection;
pub use query::{QueryManager, QueryResults};
pub use registry::Registry;
pub use term::{AsTerm, Term, TermId};
