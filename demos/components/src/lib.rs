//! Example shapes for the component runtime.
//!
//! These demonstrate plain shapes ([`Position`], [`Sprite`]) and a
//! serialisable one ([`Velocity`], whose external form is [`VelocityData`]).

use engine_component::{ComponentDefinition, Registry, Serializable, Shape, Term};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A world-space position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub value: Vec3,
}

impl Shape for Position {
    fn type_name() -> &'static str {
        "Position"
    }
}

/// A 3D velocity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    /// Linear velocity in world units per second.
    pub linear: Vec3,
}

impl Velocity {
    /// Create a new velocity.
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            linear: Vec3::new(x, y, z),
        }
    }
}

/// External form of [`Velocity`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VelocityData {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Shape for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}

impl Serializable for Velocity {
    type Data = VelocityData;

    fn deserialize(&mut self, data: VelocityData) {
        self.linear = Vec3::new(data.x, data.y, data.z);
    }

    fn serialize(&self, target: &mut VelocityData) {
        target.x = self.linear.x;
        target.y = self.linear.y;
        target.z = self.linear.z;
    }
}

/// A visible marker with its own local offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub visible: bool,
    pub offset: Vec3,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            visible: true,
            offset: Vec3::ZERO,
        }
    }
}

impl Shape for Sprite {
    fn type_name() -> &'static str {
        "SpriteComponent"
    }

    fn human_name() -> Option<&'static str> {
        Some("Sprite")
    }
}

/// The example components, defined against one registry.
#[derive(Debug, Clone)]
pub struct Components {
    pub position: ComponentDefinition<Position>,
    pub velocity: ComponentDefinition<Velocity, VelocityData>,
    pub sprite: ComponentDefinition<Sprite>,
}

impl Components {
    /// Define every example component in `registry`.
    #[must_use]
    pub fn define(registry: &Registry) -> Self {
        Self {
            position: registry.define::<Position>(),
            velocity: registry.define_serializable::<Velocity>(),
            sprite: registry.define::<Sprite>(),
        }
    }

    /// One term per component, for building a query manager.
    #[must_use]
    pub fn terms(&self) -> Vec<Term> {
        vec![
            self.position.term(),
            self.velocity.term(),
            self.sprite.term(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use engine_component::{
        ComponentError, Entity, EntityAllocator, ObservableSet, RegistryConfig, observer,
    };

    use super::*;

    fn set_up() -> (Registry, Components) {
        let registry = Registry::new(RegistryConfig::new(true));
        let components = Components::define(&registry);
        (registry, components)
    }

    #[test]
    fn test_velocity_serialize() {
        let (_registry, c) = set_up();
        let entity = EntityAllocator::new().allocate();
        c.velocity
            .add_with(&entity, VelocityData { x: 1.0, y: 2.0, z: 3.0 })
            .unwrap();

        assert_eq!(entity.get::<Velocity>().unwrap().linear, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(
            serde_json::to_value(c.velocity.serialize(&entity)).unwrap(),
            serde_json::json!({"x": 1.0, "y": 2.0, "z": 3.0})
        );

        let mut target = VelocityData::default();
        let returned = *c.velocity.serialize_into(&entity, &mut target);
        assert_eq!(returned, target);
        assert_eq!(target, VelocityData { x: 1.0, y: 2.0, z: 3.0 });
    }

    #[test]
    fn test_position_json_shape() {
        let (_registry, c) = set_up();
        let entity = EntityAllocator::new().allocate();
        c.position.add(&entity).unwrap();
        entity.get_mut::<Position>().unwrap().value = Vec3::new(1.0, 2.0, 3.0);

        let json = serde_json::to_value(*entity.get::<Position>().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"value": [1.0, 2.0, 3.0]}));
        let back: Position = serde_json::from_value(json).unwrap();
        assert_eq!(back.value, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_velocity_data_from_json() {
        let data: VelocityData = serde_json::from_str(r#"{"x": 4, "y": 5, "z": 6}"#).unwrap();
        let (_registry, c) = set_up();
        let entity = EntityAllocator::new().allocate();
        c.velocity.add_with(&entity, data).unwrap();
        assert_eq!(*entity.get::<Velocity>().unwrap(), Velocity::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_composition_preserves_other_components() {
        let (_registry, c) = set_up();
        let entity = EntityAllocator::new().allocate();
        c.position.add(&entity).unwrap();
        c.velocity.add(&entity).unwrap();
        entity.get_mut::<Position>().unwrap().value = Vec3::X;

        c.velocity.remove(&entity);
        assert!(c.position.has(&entity));
        assert_eq!(entity.get::<Position>().unwrap().value, Vec3::X);
        assert!(entity.get::<Velocity>().is_none());
    }

    #[test]
    fn test_sprite_diagnostic_name() {
        let (_registry, c) = set_up();
        assert_eq!(c.sprite.to_string(), "Sprite");
        assert_eq!(c.position.to_string(), "Position");
    }

    #[test]
    fn test_position_without_velocity_query() {
        let (registry, c) = set_up();
        let manager = registry.query_manager(c.terms());
        let query = manager
            .query(&[c.position.term(), registry.not(&c.velocity)])
            .unwrap();

        let e2 = EntityAllocator::new().allocate();
        c.position.add(&e2).unwrap();

        let streamed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&streamed);
        let _stream = query.stream(observer(move |e: &Entity| sink.borrow_mut().push(e.clone())));
        assert_eq!(*streamed.borrow(), vec![e2.clone()]);

        let removed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&removed);
        let _removed = query.on_remove(observer(move |e: &Entity| sink.borrow_mut().push(e.clone())));
        c.velocity
            .add_with(&e2, VelocityData { x: 1.0, y: 0.0, z: 0.0 })
            .unwrap();
        assert_eq!(*removed.borrow(), vec![e2]);
    }

    #[test]
    fn test_unregistered_sprite_is_rejected() {
        let (registry, c) = set_up();
        let manager = registry.query_manager([c.position.term()]);
        assert_eq!(
            manager.query(&[c.position.term(), c.sprite.term()]).unwrap_err(),
            ComponentError::Unregistered {
                term: "Sprite".into()
            }
        );
    }
}
