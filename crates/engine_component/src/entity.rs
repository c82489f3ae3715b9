//! Entity handles and allocation.
//!
//! An [`Entity`] is an identity-compared handle: two handles are equal only if
//! they were cloned from the same allocation. Each entity owns a sparse map
//! from [`ComponentTypeId`] to the shape instance installed under it. No single
//! component owns the entity; each one installs and removes only its own entry.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::component::{ComponentTypeId, Shape};

struct EntityData {
    id: u64,
    components: RefCell<HashMap<ComponentTypeId, Box<dyn Any>>>,
}

/// An opaque, identity-compared entity handle.
///
/// Cloning is cheap and yields a handle to the same entity.
#[derive(Clone)]
pub struct Entity(Rc<EntityData>);

impl Entity {
    fn new(id: u64) -> Self {
        Self(Rc::new(EntityData {
            id,
            components: RefCell::new(HashMap::new()),
        }))
    }

    /// Diagnostic identifier assigned by the allocator.
    ///
    /// Not used for equality; handles from different allocators may share ids.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Returns `true` if the entity carries a value of shape `S`.
    #[must_use]
    pub fn contains<S: Shape>(&self) -> bool {
        self.0
            .components
            .borrow()
            .get(&S::component_type_id())
            .is_some_and(|value| value.is::<S>())
    }

    /// Borrow the installed `S`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the entity's components are currently mutably borrowed.
    #[must_use]
    pub fn get<S: Shape>(&self) -> Option<Ref<'_, S>> {
        Ref::filter_map(self.0.components.borrow(), |map| {
            map.get(&S::component_type_id())
                .and_then(|value| value.downcast_ref::<S>())
        })
        .ok()
    }

    /// Mutably borrow the installed `S`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the entity's components are currently borrowed.
    #[must_use]
    pub fn get_mut<S: Shape>(&self) -> Option<RefMut<'_, S>> {
        RefMut::filter_map(self.0.components.borrow_mut(), |map| {
            map.get_mut(&S::component_type_id())
                .and_then(|value| value.downcast_mut::<S>())
        })
        .ok()
    }

    /// Type ids of every shape currently installed on the entity.
    #[must_use]
    pub fn component_ids(&self) -> Vec<ComponentTypeId> {
        self.0.components.borrow().keys().copied().collect()
    }

    /// Install `S::default()` unless something is already stored under the
    /// shape's id. Returns `true` if a fresh value was installed.
    pub(crate) fn install<S: Shape>(&self) -> bool {
        let mut components = self.0.components.borrow_mut();
        let id = S::component_type_id();
        if components.contains_key(&id) {
            return false;
        }
        components.insert(id, Box::new(S::default()));
        true
    }

    /// Delete the value stored under the shape's id if it is an `S`.
    pub(crate) fn uninstall<S: Shape>(&self) -> bool {
        let mut components = self.0.components.borrow_mut();
        let id = S::component_type_id();
        if components.get(&id).is_some_and(|value| value.is::<S>()) {
            components.remove(&id);
            return true;
        }
        false
    }

    /// Describe what is stored under the shape's id, for diagnostics.
    pub(crate) fn probe<S: Shape>(&self) -> Option<&'static str> {
        let components = self.0.components.borrow();
        match components.get(&S::component_type_id()) {
            None => Some("no value installed"),
            Some(value) if !value.is::<S>() => Some("value of a different type installed"),
            Some(_) => None,
        }
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.0), state);
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0.id)
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0.id)
    }
}

/// Hands out fresh entities with monotonically increasing ids.
///
/// Stands in for whatever world object owns entity lifetimes; the component
/// machinery never creates entities itself.
#[derive(Debug)]
pub struct EntityAllocator {
    next_id: u64,
}

impl EntityAllocator {
    /// Creates a new allocator. Ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Allocates a fresh entity with no components.
    pub fn allocate(&mut self) -> Entity {
        let id = self.next_id;
        self.next_id += 1;
        Entity::new(id)
    }

    /// Returns the number of entities allocated so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.next_id - 1
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Tag(u32);

    impl Shape for Tag {
        fn type_name() -> &'static str {
            "Tag"
        }
    }

    #[test]
    fn test_allocator_produces_unique_ids() {
        let mut alloc = EntityAllocator::new();
        let e1 = alloc.allocate();
        let e2 = alloc.allocate();
        let e3 = alloc.allocate();
        assert_eq!(e1.id(), 1);
        assert_eq!(e2.id(), 2);
        assert_eq!(e3.id(), 3);
        assert_eq!(alloc.count(), 3);
    }

    #[test]
    fn test_identity_not_id_equality() {
        let mut a = EntityAllocator::new();
        let mut b = EntityAllocator::new();
        let ea = a.allocate();
        let eb = b.allocate();
        assert_eq!(ea.id(), eb.id());
        assert_ne!(ea, eb);
        assert_eq!(ea, ea.clone());

        let set: HashSet<Entity> = [ea.clone(), eb, ea].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_install_keeps_existing_value() {
        let entity = EntityAllocator::new().allocate();
        assert!(entity.install::<Tag>());
        entity.get_mut::<Tag>().unwrap().0 = 7;
        assert!(!entity.install::<Tag>());
        assert_eq!(*entity.get::<Tag>().unwrap(), Tag(7));
    }

    #[test]
    fn test_uninstall_removes_only_own_entry() {
        let entity = EntityAllocator::new().allocate();
        entity.install::<Tag>();
        assert!(entity.contains::<Tag>());
        assert!(entity.uninstall::<Tag>());
        assert!(!entity.contains::<Tag>());
        assert!(!entity.uninstall::<Tag>());
        assert!(entity.component_ids().is_empty());
    }

    #[test]
    fn test_probe_reports_missing() {
        let entity = EntityAllocator::new().allocate();
        assert_eq!(entity.probe::<Tag>(), Some("no value installed"));
        entity.install::<Tag>();
        assert_eq!(entity.probe::<Tag>(), None);
    }
}
