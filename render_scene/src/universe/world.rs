/// Universe: the simulation world seen from the render scene.
///
/// The scene never owns transforms. It reads them through the `Universe`
/// trait and drains the set of entities moved since the previous frame.
/// `World` is the in-crate implementation used by tools and tests.

use std::sync::{PoisonError, RwLock};
use glam::{Mat4, Quat, Vec3};
use rustc_hash::FxHashSet;
use super::entity::{Entity, Transform};

/// Read access to entity transforms plus moved-entity notifications.
///
/// Shared between the simulation and the render scene, so implementations
/// use interior mutability.
pub trait Universe: Send + Sync {
    /// Transform of a live entity, `None` for dead or unknown entities.
    fn transform(&self, entity: Entity) -> Option<Transform>;

    /// Drain entities whose transform changed since the previous call.
    fn take_moved_entities(&self) -> Vec<Entity>;

    fn is_alive(&self, entity: Entity) -> bool {
        self.transform(entity).is_some()
    }

    fn position(&self, entity: Entity) -> Vec3 {
        self.transform(entity).map_or(Vec3::ZERO, |t| t.position)
    }

    fn rotation(&self, entity: Entity) -> Quat {
        self.transform(entity).map_or(Quat::IDENTITY, |t| t.rotation)
    }

    fn scale(&self, entity: Entity) -> f32 {
        self.transform(entity).map_or(1.0, |t| t.scale)
    }

    fn matrix(&self, entity: Entity) -> Mat4 {
        self.transform(entity).map_or(Mat4::IDENTITY, |t| t.matrix())
    }
}

#[derive(Default)]
struct WorldState {
    /// Dense transform storage indexed by entity (None = free slot)
    transforms: Vec<Option<Transform>>,
    /// Free entity indices, reused LIFO
    free_list: Vec<u32>,
    /// Entities moved since the last take_moved_entities()
    moved: FxHashSet<Entity>,
}

/// Reference simulation world: entity allocation and transforms.
#[derive(Default)]
pub struct World {
    state: RwLock<WorldState>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an entity with the given transform.
    pub fn create_entity(&self, transform: Transform) -> Entity {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match state.free_list.pop() {
            Some(index) => {
                state.transforms[index as usize] = Some(transform);
                Entity(index)
            }
            None => {
                state.transforms.push(Some(transform));
                Entity((state.transforms.len() - 1) as u32)
            }
        }
    }

    /// Create an entity at a position with identity rotation and unit scale.
    pub fn create_entity_at(&self, position: Vec3) -> Entity {
        self.create_entity(Transform::from_position(position))
    }

    /// Destroy an entity. Components attached to it must be destroyed by
    /// their owners first. Returns false if the entity was not alive.
    pub fn destroy_entity(&self, entity: Entity) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match state.transforms.get_mut(entity.index()) {
            Some(slot @ Some(_)) => {
                *slot = None;
                state.free_list.push(entity.0);
                state.moved.remove(&entity);
                true
            }
            _ => false,
        }
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.transforms.iter().filter(|t| t.is_some()).count()
    }

    // ===== SETTERS (each marks the entity as moved) =====

    pub fn set_transform(&self, entity: Entity, transform: Transform) -> bool {
        self.modify(entity, |t| *t = transform)
    }

    pub fn set_position(&self, entity: Entity, position: Vec3) -> bool {
        self.modify(entity, |t| t.position = position)
    }

    pub fn set_rotation(&self, entity: Entity, rotation: Quat) -> bool {
        self.modify(entity, |t| t.rotation = rotation)
    }

    pub fn set_scale(&self, entity: Entity, scale: f32) -> bool {
        self.modify(entity, |t| t.scale = scale)
    }

    fn modify(&self, entity: Entity, f: impl FnOnce(&mut Transform)) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let Some(Some(transform)) = state.transforms.get_mut(entity.index()) else {
            return false;
        };
        f(transform);
        state.moved.insert(entity);
        true
    }
}

impl Universe for World {
    fn transform(&self, entity: Entity) -> Option<Transform> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.transforms.get(entity.index()).copied().flatten()
    }

    fn take_moved_entities(&self) -> Vec<Entity> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut moved: Vec<Entity> = state.moved.drain().collect();
        moved.sort_unstable();
        moved
    }
}

#[cfg(test)]
#[path = "world_tests.rs"]
mod tests;
