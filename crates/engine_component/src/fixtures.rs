//! Shapes shared by the unit tests.

use crate::component::{Serializable, Shape};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Sprite {
    pub visible: bool,
}

impl Default for Sprite {
    fn default() -> Self {
        Self { visible: true }
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

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Velocity {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct VelocityData {
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
        self.x = data.x;
        self.y = data.y;
        self.z = data.z;
    }

    fn serialize(&self, target: &mut VelocityData) {
        target.x = self.x;
        target.y = self.y;
        target.z = self.z;
    }
}

/// Declares no name at all.
#[derive(Debug, Default)]
pub(crate) struct Marker;

impl Shape for Marker {
    fn type_name() -> &'static str {
        ""
    }
}
