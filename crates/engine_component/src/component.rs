//! Component definitions.
//!
//! A [`Shape`] is the bundle of state a component installs on an entity. A
//! [`ComponentDefinition`] owns the set of entities currently carrying that
//! shape and is the only way to change it: `add` installs the shape and
//! registers the entity, `remove` deletes the shape and unregisters it.
//!
//! ## Type identity
//!
//! A shape is installed under its [`ComponentTypeId`], derived from the
//! shape's declared name with FNV-1a 64-bit. Two shapes that declare the same
//! name collide; strict validation reports the collision on `add`.
//!
//! ## Serialisation capability
//!
//! Shapes that implement [`Serializable`] can be filled from a `Data` payload
//! on `add` and written back out with `serialize`. The capability is fixed
//! when the component is defined, not checked per call.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::collection::{
    ObservableCollection, ObservableSet, Observer, ReadonlyCollection, Subscription,
};
use crate::config::RegistryConfig;
use crate::entity::Entity;
use crate::error::ComponentError;
use crate::term::{AsTerm, QueryTerm, Term, TermId};

/// Name reported by a shape that declares neither a human name nor a type
/// name.
pub const ANONYMOUS_COMPONENT: &str = "anonymous component";

/// A unique identifier for a shape, derived from its declared name using
/// FNV-1a 64-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

impl ComponentTypeId {
    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Hash a shape name.
    ///
    /// ```text
    /// hash = 0xcbf29ce484222325
    /// for each byte in name.as_bytes():
    ///     hash = (hash XOR byte) * 0x00000100000001b3
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// The id shape `S` is installed under.
    #[must_use]
    pub fn of<S: Shape>() -> Self {
        S::component_type_id()
    }
}

/// The state bundle a component installs on an entity.
///
/// `Default` provides the fresh instance installed by `add`.
///
/// # Examples
///
/// ```rust
/// use engine_component::Shape;
///
/// #[derive(Debug, Default)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Shape for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Shape: Default + 'static {
    /// The declared name of the shape.
    fn type_name() -> &'static str;

    /// Optional human-readable name, preferred over [`Shape::type_name`] in
    /// diagnostics.
    fn human_name() -> Option<&'static str> {
        None
    }

    /// The id this shape is installed under on an entity.
    fn component_type_id() -> ComponentTypeId {
        ComponentTypeId::from_name(Self::type_name())
    }
}

/// A shape that can be filled from, and written to, an external `Data` form.
pub trait Serializable: Shape {
    /// The external form.
    type Data: Default + 'static;

    /// Apply `data` to a freshly installed (or pre-existing) instance.
    fn deserialize(&mut self, data: Self::Data);

    /// Write this instance into `target`.
    fn serialize(&self, target: &mut Self::Data);
}

/// Diagnostic name of shape `S`.
fn diagnostic_name<S: Shape>() -> String {
    match S::human_name() {
        Some(name) => name.to_string(),
        None if !S::type_name().is_empty() => S::type_name().to_string(),
        None => ANONYMOUS_COMPONENT.to_string(),
    }
}

struct Codec<S, D> {
    deserialize: fn(&mut S, D),
    serialize: fn(&S, &mut D),
}

struct ComponentInner<S, D> {
    id: TermId,
    name: String,
    strict: bool,
    codec: Option<Codec<S, D>>,
    entities: ObservableCollection<Entity>,
}

/// Owner of one shape's membership.
///
/// Cloning yields another handle to the same definition.
pub struct ComponentDefinition<S, D = ()> {
    inner: Rc<ComponentInner<S, D>>,
}

impl<S, D> Clone for ComponentDefinition<S, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: Shape, D: 'static> ComponentDefinition<S, D> {
    /// Define a component without serialisation hooks.
    ///
    /// `data` passed to [`ComponentDefinition::add_with`] is ignored and
    /// [`ComponentDefinition::serialize_into`] leaves its target untouched.
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_codec(config, None)
    }

    fn with_codec(config: RegistryConfig, codec: Option<Codec<S, D>>) -> Self {
        let name = diagnostic_name::<S>();
        debug!(
            component = %name,
            type_id = S::component_type_id().0,
            serializable = codec.is_some(),
            "component defined"
        );
        Self {
            inner: Rc::new(ComponentInner {
                id: TermId::next(),
                entities: ObservableCollection::with_label(name.clone()),
                name,
                strict: config.strict_validation,
                codec,
            }),
        }
    }

    /// Install `S` on `entity` and register it.
    ///
    /// A value already installed under the shape's id is kept. Adding an
    /// entity that is already a member fires no event.
    ///
    /// # Errors
    ///
    /// With strict validation, returns [`ComponentError::InvariantViolation`]
    /// if the entity does not carry an `S` afterwards. Membership is left
    /// unchanged in that case.
    ///
    /// # Panics
    ///
    /// Panics if the caller holds a borrow of the entity's components.
    pub fn add(&self, entity: &Entity) -> Result<(), ComponentError> {
        self.insert(entity, None)
    }

    /// Like [`ComponentDefinition::add`], then fill the instance from `data`
    /// if the shape is serialisable.
    ///
    /// # Errors
    ///
    /// See [`ComponentDefinition::add`].
    pub fn add_with(&self, entity: &Entity, data: D) -> Result<(), ComponentError> {
        self.insert(entity, Some(data))
    }

    fn insert(&self, entity: &Entity, data: Option<D>) -> Result<(), ComponentError> {
        let fresh = entity.install::<S>();

        if let (Some(data), Some(codec)) = (data, self.inner.codec.as_ref())
            && let Some(mut shape) = entity.get_mut::<S>()
        {
            (codec.deserialize)(&mut *shape, data);
        }

        if self.inner.strict
            && let Some(reason) = entity.probe::<S>()
        {
            warn!(component = %self.inner.name, %entity, reason, "component invariant violated");
            return Err(ComponentError::InvariantViolation {
                component: self.inner.name.clone(),
                reason: reason.to_string(),
            });
        }

        debug!(component = %self.inner.name, %entity, fresh, "component added");
        self.inner.entities.add(entity.clone());
        Ok(())
    }

    /// Delete `S` from `entity` and unregister it. Other shapes on the entity
    /// are untouched.
    ///
    /// Returns `true` if the entity was a member. A non-member is left
    /// untouched, even if it carries `S` through another definition.
    pub fn remove(&self, entity: &Entity) -> bool {
        if !self.inner.entities.has(entity) {
            return false;
        }
        entity.uninstall::<S>();
        self.inner.entities.remove(entity);
        debug!(component = %self.inner.name, %entity, "component removed");
        true
    }

    /// Returns `true` if `entity` is a member.
    #[must_use]
    pub fn has(&self, entity: &Entity) -> bool {
        self.inner.entities.has(entity)
    }

    /// Read-only view of the member entities.
    #[must_use]
    pub fn entities(&self) -> ReadonlyCollection<Entity> {
        self.inner.entities.readonly()
    }

    /// Number of member entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entities.len()
    }

    /// Returns `true` if no entity is a member.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entities.is_empty()
    }

    /// Returns `true` if the definition carries serialisation hooks.
    #[must_use]
    pub fn is_serializable(&self) -> bool {
        self.inner.codec.is_some()
    }

    /// The id the shape is installed under.
    #[must_use]
    pub fn component_type_id(&self) -> ComponentTypeId {
        S::component_type_id()
    }

    /// Write `entity`'s instance into `target` and return it.
    ///
    /// `target` is returned untouched when the definition has no hooks or the
    /// entity does not carry the shape.
    pub fn serialize_into<'t>(&self, entity: &Entity, target: &'t mut D) -> &'t mut D {
        if let Some(codec) = self.inner.codec.as_ref()
            && let Some(shape) = entity.get::<S>()
        {
            (codec.serialize)(&*shape, target);
        }
        target
    }

    /// Serialise `entity`'s instance into a fresh `D`.
    #[must_use]
    pub fn serialize(&self, entity: &Entity) -> D
    where
        D: Default,
    {
        let mut target = D::default();
        self.serialize_into(entity, &mut target);
        target
    }

    /// The query term for this component.
    #[must_use]
    pub fn term(&self) -> Term {
        Term::new(Rc::clone(&self.inner) as Rc<dyn QueryTerm>)
    }
}

impl<S: Serializable> ComponentDefinition<S, S::Data> {
    /// Define a component whose `add_with` and `serialize` use the shape's
    /// [`Serializable`] hooks.
    #[must_use]
    pub fn serializable(config: RegistryConfig) -> Self {
        Self::with_codec(
            config,
            Some(Codec {
                deserialize: <S as Serializable>::deserialize,
                serialize: <S as Serializable>::serialize,
            }),
        )
    }
}

impl<S: Shape, D: 'static> AsTerm for ComponentDefinition<S, D> {
    fn as_term(&self) -> Term {
        self.term()
    }
}

impl<S, D> std::fmt::Display for ComponentDefinition<S, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.inner.name)
    }
}

impl<S, D> std::fmt::Debug for ComponentDefinition<S, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("name", &self.inner.name)
            .field("members", &self.inner.entities.len())
            .finish()
    }
}

impl<S: Shape, D: 'static> ObservableSet<Entity> for ComponentInner<S, D> {
    fn has(&self, item: &Entity) -> bool {
        self.entities.has(item)
    }

    fn on_add(&self, observer: Observer<Entity>) -> Subscription {
        self.entities.on_add(observer)
    }

    fn on_remove(&self, observer: Observer<Entity>) -> Subscription {
        self.entities.on_remove(observer)
    }

    fn stream(&self, observer: Observer<Entity>) -> Subscription {
        self.entities.stream(observer)
    }
}

impl<S: Shape, D: 'static> QueryTerm for ComponentInner<S, D> {
    fn term_id(&self) -> TermId {
        self.id
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn members(&self) -> Option<ReadonlyCollection<Entity>> {
        Some(self.entities.readonly())
    }
}
