/// Particle emitters and their modules.
///
/// An emitter record exists while the entity has the emitter component or
/// any emitter module component. Each module kind is a component of its
/// own, stored in the record's module list (at most one per kind).
/// Particle simulation is not done here.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use crate::universe::{ComponentHandle, Entity};
use crate::{prism_debug, prism_warn};
use super::render_scene::{RenderScene, SOURCE};

/// Capacity of plane and attractor entity lists
pub const MAX_MODULE_ENTITIES: usize = 8;

/// Smallest spawn period accepted, in seconds
pub const MIN_SPAWN_PERIOD: f32 = 0.01;

// ============================================================================
// ENTITY LIST
// ============================================================================

/// Fixed-capacity list of entities referenced by a module. Slots may be
/// unset (`None`) until an entity is assigned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Option<Entity>>", into = "Vec<Option<Entity>>")]
pub struct EntityList {
    entities: Vec<Option<Entity>>,
}

impl From<Vec<Option<Entity>>> for EntityList {
    fn from(mut entities: Vec<Option<Entity>>) -> Self {
        entities.truncate(MAX_MODULE_ENTITIES);
        Self { entities }
    }
}

impl From<EntityList> for Vec<Option<Entity>> {
    fn from(list: EntityList) -> Self {
        list.entities
    }
}

impl EntityList {
    /// Insert an unset slot at `index`, or append with `None` or an index
    /// past the end. Refused when the list is full.
    pub fn insert(&mut self, index: Option<usize>) -> bool {
        if self.entities.len() >= MAX_MODULE_ENTITIES {
            return false;
        }
        match index {
            Some(index) if index < self.entities.len() => self.entities.insert(index, None),
            _ => self.entities.push(None),
        }
        true
    }

    /// Remove the slot at `index`, shifting later slots down.
    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.entities.len() {
            return false;
        }
        self.entities.remove(index);
        true
    }

    pub fn set(&mut self, index: usize, entity: Option<Entity>) -> bool {
        match self.entities.get_mut(index) {
            Some(slot) => {
                *slot = entity;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<Entity> {
        self.entities.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entities.len() >= MAX_MODULE_ENTITIES
    }

    pub fn as_slice(&self) -> &[Option<Entity>] {
        &self.entities
    }
}

// ============================================================================
// MODULES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmitterModuleKind {
    Alpha,
    Attractor,
    Force,
    LinearMovement,
    Plane,
    RandomRotation,
    Size,
    SpawnShape,
    Subimage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EmitterModule {
    /// Alpha over normalized lifetime, as (time, alpha) keys
    Alpha { curve: Vec<Vec2> },
    Attractor { entities: EntityList, force: f32 },
    Force { acceleration: Vec3 },
    /// Initial velocity range per axis
    LinearMovement { x: Vec2, y: Vec2, z: Vec2 },
    Plane { entities: EntityList, bounce: f32 },
    RandomRotation,
    /// Size over normalized lifetime, as (time, size) keys
    Size { curve: Vec<Vec2> },
    SpawnShape { radius: f32 },
    /// Sprite sheet layout
    Subimage { rows: u32, cols: u32 },
}

impl EmitterModule {
    pub fn new(kind: EmitterModuleKind) -> Self {
        match kind {
            EmitterModuleKind::Alpha => EmitterModule::Alpha {
                curve: vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)],
            },
            EmitterModuleKind::Attractor => EmitterModule::Attractor {
                entities: EntityList::default(),
                force: 0.0,
            },
            EmitterModuleKind::Force => EmitterModule::Force { acceleration: Vec3::ZERO },
            EmitterModuleKind::LinearMovement => EmitterModule::LinearMovement {
                x: Vec2::ZERO,
                y: Vec2::ZERO,
                z: Vec2::ZERO,
            },
            EmitterModuleKind::Plane => EmitterModule::Plane {
                entities: EntityList::default(),
                bounce: 0.5,
            },
            EmitterModuleKind::RandomRotation => EmitterModule::RandomRotation,
            EmitterModuleKind::Size => EmitterModule::Size {
                curve: vec![Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0)],
            },
            EmitterModuleKind::SpawnShape => EmitterModule::SpawnShape { radius: 1.0 },
            EmitterModuleKind::Subimage => EmitterModule::Subimage { rows: 1, cols: 1 },
        }
    }

    pub fn kind(&self) -> EmitterModuleKind {
        match self {
            EmitterModule::Alpha { .. } => EmitterModuleKind::Alpha,
            EmitterModule::Attractor { .. } => EmitterModuleKind::Attractor,
            EmitterModule::Force { .. } => EmitterModuleKind::Force,
            EmitterModule::LinearMovement { .. } => EmitterModuleKind::LinearMovement,
            EmitterModule::Plane { .. } => EmitterModuleKind::Plane,
            EmitterModule::RandomRotation => EmitterModuleKind::RandomRotation,
            EmitterModule::Size { .. } => EmitterModuleKind::Size,
            EmitterModule::SpawnShape { .. } => EmitterModuleKind::SpawnShape,
            EmitterModule::Subimage { .. } => EmitterModuleKind::Subimage,
        }
    }

    /// Entity list of plane and attractor modules
    pub fn entities(&self) -> Option<&EntityList> {
        match self {
            EmitterModule::Attractor { entities, .. } | EmitterModule::Plane { entities, .. } => Some(entities),
            _ => None,
        }
    }

    pub fn entities_mut(&mut self) -> Option<&mut EntityList> {
        match self {
            EmitterModule::Attractor { entities, .. } | EmitterModule::Plane { entities, .. } => Some(entities),
            _ => None,
        }
    }
}

// ============================================================================
// EMITTER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleEmitter {
    pub entity: Entity,
    /// Whether the emitter component itself exists
    #[serde(skip)]
    pub(super) is_valid: bool,
    pub material_path: String,
    pub autoemit: bool,
    pub local_space: bool,
    spawn_period: Vec2,
    pub initial_life: Vec2,
    pub initial_size: Vec2,
    spawn_count: (u32, u32),
    #[serde(skip)]
    pub(super) modules: Vec<EmitterModule>,
}

impl ParticleEmitter {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            is_valid: false,
            material_path: String::new(),
            autoemit: true,
            local_space: false,
            spawn_period: Vec2::new(1.0, 2.0),
            initial_life: Vec2::new(1.0, 2.0),
            initial_size: Vec2::new(1.0, 1.0),
            spawn_count: (1, 1),
            modules: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// The record is kept while the emitter or any module exists
    pub fn is_alive(&self) -> bool {
        self.is_valid || !self.modules.is_empty()
    }

    pub fn spawn_period(&self) -> Vec2 {
        self.spawn_period
    }

    /// Set the (min, max) spawn period. Min is clamped to MIN_SPAWN_PERIOD
    /// and max to at least min.
    pub fn set_spawn_period(&mut self, period: Vec2) {
        let from = period.x.max(MIN_SPAWN_PERIOD);
        self.spawn_period = Vec2::new(from, period.y.max(from));
    }

    pub fn spawn_count(&self) -> (u32, u32) {
        self.spawn_count
    }

    /// Set the (min, max) particles per spawn, max clamped to at least min.
    pub fn set_spawn_count(&mut self, from: u32, to: u32) {
        self.spawn_count = (from, to.max(from));
    }

    pub fn modules(&self) -> &[EmitterModule] {
        &self.modules
    }

    pub fn module(&self, kind: EmitterModuleKind) -> Option<&EmitterModule> {
        self.modules.iter().find(|module| module.kind() == kind)
    }

    pub fn module_mut(&mut self, kind: EmitterModuleKind) -> Option<&mut EmitterModule> {
        self.modules.iter_mut().find(|module| module.kind() == kind)
    }

    pub fn has_module(&self, kind: EmitterModuleKind) -> bool {
        self.module(kind).is_some()
    }
}

// ============================================================================
// SCENE API
// ============================================================================

impl RenderScene {
    fn allocate_particle_emitter(&mut self, entity: Entity) -> &mut ParticleEmitter {
        self.particle_emitters.entry(entity).or_insert_with(|| ParticleEmitter::new(entity))
    }

    fn cleanup_particle_emitter(&mut self, entity: Entity) {
        if self.particle_emitters.get(&entity).is_some_and(|emitter| !emitter.is_alive()) {
            self.particle_emitters.remove(&entity);
        }
    }

    pub fn create_particle_emitter(&mut self, entity: Entity) -> ComponentHandle {
        let emitter = self.allocate_particle_emitter(entity);
        if emitter.is_valid {
            prism_warn!(SOURCE, "Entity {} already has a particle emitter", entity.0);
        } else {
            emitter.is_valid = true;
            prism_debug!(SOURCE, "Particle emitter created on entity {}", entity.0);
        }
        ComponentHandle::from_entity(entity)
    }

    /// Restore persisted emitter parameters, keeping modules already present.
    pub(super) fn insert_particle_emitter(&mut self, mut emitter: ParticleEmitter) {
        let existing = self.allocate_particle_emitter(emitter.entity);
        emitter.modules = std::mem::take(&mut existing.modules);
        emitter.is_valid = true;
        *existing = emitter;
    }

    pub fn destroy_particle_emitter(&mut self, handle: ComponentHandle) -> bool {
        let entity = handle.entity();
        let Some(emitter) = self.particle_emitters.get_mut(&entity).filter(|e| e.is_valid) else {
            prism_warn!(SOURCE, "Destroying unknown particle emitter {}", handle.0);
            return false;
        };
        emitter.is_valid = false;
        self.cleanup_particle_emitter(entity);
        true
    }

    /// Emitter record, present while the emitter or any of its modules exists.
    pub fn particle_emitter(&self, handle: ComponentHandle) -> Option<&ParticleEmitter> {
        self.particle_emitters.get(&handle.entity())
    }

    pub fn particle_emitter_mut(&mut self, handle: ComponentHandle) -> Option<&mut ParticleEmitter> {
        self.particle_emitters.get_mut(&handle.entity())
    }

    /// Add a module with default parameters.
    pub fn create_emitter_module(&mut self, entity: Entity, kind: EmitterModuleKind) -> ComponentHandle {
        let emitter = self.allocate_particle_emitter(entity);
        if emitter.has_module(kind) {
            prism_warn!(SOURCE, "Entity {} already has a {:?} emitter module", entity.0, kind);
        } else {
            emitter.modules.push(EmitterModule::new(kind));
        }
        ComponentHandle::from_entity(entity)
    }

    /// Add or replace a module with persisted parameters.
    pub(super) fn insert_emitter_module(&mut self, entity: Entity, module: EmitterModule) {
        let emitter = self.allocate_particle_emitter(entity);
        match emitter.module_mut(module.kind()) {
            Some(existing) => *existing = module,
            None => emitter.modules.push(module),
        }
    }

    pub fn destroy_emitter_module(&mut self, handle: ComponentHandle, kind: EmitterModuleKind) -> bool {
        let entity = handle.entity();
        let Some(emitter) = self.particle_emitters.get_mut(&entity) else {
            return false;
        };
        let count = emitter.modules.len();
        emitter.modules.retain(|module| module.kind() != kind);
        if emitter.modules.len() == count {
            prism_warn!(SOURCE, "Destroying unknown {:?} emitter module {}", kind, handle.0);
            return false;
        }
        self.cleanup_particle_emitter(entity);
        true
    }

    pub fn emitter_module(&self, handle: ComponentHandle, kind: EmitterModuleKind) -> Option<&EmitterModule> {
        self.particle_emitter(handle)?.module(kind)
    }

    pub fn emitter_module_mut(&mut self, handle: ComponentHandle, kind: EmitterModuleKind) -> Option<&mut EmitterModule> {
        self.particle_emitter_mut(handle)?.module_mut(kind)
    }

    // ===== PLANE / ATTRACTOR ENTITY LISTS =====

    fn emitter_entity_list_mut(&mut self, handle: ComponentHandle, kind: EmitterModuleKind) -> Option<&mut EntityList> {
        self.emitter_module_mut(handle, kind)?.entities_mut()
    }

    fn add_emitter_entity_slot(&mut self, handle: ComponentHandle, kind: EmitterModuleKind, index: Option<usize>) -> bool {
        let Some(list) = self.emitter_entity_list_mut(handle, kind) else {
            return false;
        };
        if !list.insert(index) {
            prism_warn!(SOURCE, "{:?} module of entity {} is full ({} entities)", kind, handle.0, MAX_MODULE_ENTITIES);
            return false;
        }
        true
    }

    /// Insert an unset plane slot (append with `None`). Refused when full.
    pub fn add_emitter_plane(&mut self, handle: ComponentHandle, index: Option<usize>) -> bool {
        self.add_emitter_entity_slot(handle, EmitterModuleKind::Plane, index)
    }

    pub fn remove_emitter_plane(&mut self, handle: ComponentHandle, index: usize) -> bool {
        self.emitter_entity_list_mut(handle, EmitterModuleKind::Plane)
            .is_some_and(|list| list.remove(index))
    }

    pub fn set_emitter_plane_entity(&mut self, handle: ComponentHandle, index: usize, entity: Option<Entity>) -> bool {
        self.emitter_entity_list_mut(handle, EmitterModuleKind::Plane)
            .is_some_and(|list| list.set(index, entity))
    }

    pub fn emitter_planes(&self, handle: ComponentHandle) -> Option<&EntityList> {
        self.emitter_module(handle, EmitterModuleKind::Plane)?.entities()
    }

    /// Insert an unset attractor slot (append with `None`). Refused when full.
    pub fn add_emitter_attractor(&mut self, handle: ComponentHandle, index: Option<usize>) -> bool {
        self.add_emitter_entity_slot(handle, EmitterModuleKind::Attractor, index)
    }

    pub fn remove_emitter_attractor(&mut self, handle: ComponentHandle, index: usize) -> bool {
        self.emitter_entity_list_mut(handle, EmitterModuleKind::Attractor)
            .is_some_and(|list| list.remove(index))
    }

    pub fn set_emitter_attractor_entity(&mut self, handle: ComponentHandle, index: usize, entity: Option<Entity>) -> bool {
        self.emitter_entity_list_mut(handle, EmitterModuleKind::Attractor)
            .is_some_and(|list| list.set(index, entity))
    }

    pub fn emitter_attractors(&self, handle: ComponentHandle) -> Option<&EntityList> {
        self.emitter_module(handle, EmitterModuleKind::Attractor)?.entities()
    }
}

#[cfg(test)]
#[path = "particle_emitter_tests.rs"]
mod tests;
