/// Entity and component identifiers, plus the per-entity transform.
///
/// Entities are owned by the simulation world. Component handles are
/// per-kind: a model instance handle and a point light handle with the
/// same integer value name different components.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Opaque entity identifier owned by the simulation world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(pub u32);

impl Entity {
    /// Dense index of this entity (used to index per-entity arrays).
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Opaque component handle, stable for the component's lifetime.
///
/// For entity-indexed kinds the handle value equals the entity index.
/// Point lights use a monotonically increasing counter instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentHandle(pub u32);

impl ComponentHandle {
    /// Handle of an entity-indexed component.
    pub fn from_entity(entity: Entity) -> Self {
        Self(entity.0)
    }

    /// Entity of an entity-indexed component.
    pub fn entity(self) -> Entity {
        Entity(self.0)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// World transform of an entity: position, rotation and uniform scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self { position, ..Self::default() }
    }

    /// World matrix (scale, then rotation, then translation).
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.rotation, self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: 1.0,
        }
    }
}
