/// Component directory.
///
/// Every component kind the scene stores is listed in `ComponentKind`.
/// A static table maps each kind to the functions that create, destroy,
/// look up and persist it, so callers can handle components generically
/// without matching on the kind themselves.
///
/// Handles are only meaningful together with their kind: model instance
/// and most satellite handles equal the entity index, point light handles
/// come from their own counter.

use crate::error::Result;
use crate::universe::{ComponentHandle, Entity};
use super::particle_emitter::EmitterModuleKind;
use super::render_scene::RenderScene;
use super::snapshot::{ComponentRecord, SceneVersion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    ModelInstance,
    PointLight,
    GlobalLight,
    Decal,
    Camera,
    Terrain,
    EnvironmentProbe,
    ParticleEmitter,
    EmitterAlpha,
    EmitterAttractor,
    EmitterForce,
    EmitterLinearMovement,
    EmitterPlane,
    EmitterRandomRotation,
    EmitterSize,
    EmitterSpawnShape,
    EmitterSubimage,
}

impl ComponentKind {
    /// Every kind, in table (and persistence) order
    pub const ALL: [ComponentKind; 17] = [
        ComponentKind::ModelInstance,
        ComponentKind::PointLight,
        ComponentKind::GlobalLight,
        ComponentKind::Decal,
        ComponentKind::Camera,
        ComponentKind::Terrain,
        ComponentKind::EnvironmentProbe,
        ComponentKind::ParticleEmitter,
        ComponentKind::EmitterAlpha,
        ComponentKind::EmitterAttractor,
        ComponentKind::EmitterForce,
        ComponentKind::EmitterLinearMovement,
        ComponentKind::EmitterPlane,
        ComponentKind::EmitterRandomRotation,
        ComponentKind::EmitterSize,
        ComponentKind::EmitterSpawnShape,
        ComponentKind::EmitterSubimage,
    ];

    pub fn info(self) -> &'static ComponentInfo {
        &COMPONENT_INFOS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn from_name(name: &str) -> Option<Self> {
        COMPONENT_INFOS.iter().find(|info| info.name == name).map(|info| info.kind)
    }

    /// Module kind of emitter module components
    pub fn emitter_module(self) -> Option<EmitterModuleKind> {
        match self {
            ComponentKind::EmitterAlpha => Some(EmitterModuleKind::Alpha),
            ComponentKind::EmitterAttractor => Some(EmitterModuleKind::Attractor),
            ComponentKind::EmitterForce => Some(EmitterModuleKind::Force),
            ComponentKind::EmitterLinearMovement => Some(EmitterModuleKind::LinearMovement),
            ComponentKind::EmitterPlane => Some(EmitterModuleKind::Plane),
            ComponentKind::EmitterRandomRotation => Some(EmitterModuleKind::RandomRotation),
            ComponentKind::EmitterSize => Some(EmitterModuleKind::Size),
            ComponentKind::EmitterSpawnShape => Some(EmitterModuleKind::SpawnShape),
            ComponentKind::EmitterSubimage => Some(EmitterModuleKind::Subimage),
            _ => None,
        }
    }
}

impl From<EmitterModuleKind> for ComponentKind {
    fn from(kind: EmitterModuleKind) -> Self {
        match kind {
            EmitterModuleKind::Alpha => ComponentKind::EmitterAlpha,
            EmitterModuleKind::Attractor => ComponentKind::EmitterAttractor,
            EmitterModuleKind::Force => ComponentKind::EmitterForce,
            EmitterModuleKind::LinearMovement => ComponentKind::EmitterLinearMovement,
            EmitterModuleKind::Plane => ComponentKind::EmitterPlane,
            EmitterModuleKind::RandomRotation => ComponentKind::EmitterRandomRotation,
            EmitterModuleKind::Size => ComponentKind::EmitterSize,
            EmitterModuleKind::SpawnShape => ComponentKind::EmitterSpawnShape,
            EmitterModuleKind::Subimage => ComponentKind::EmitterSubimage,
        }
    }
}

// ============================================================================
// DISPATCH TABLE
// ============================================================================

pub type CreateFn = fn(&mut RenderScene, Entity) -> ComponentHandle;
pub type DestroyFn = fn(&mut RenderScene, ComponentHandle) -> bool;
pub type LookupFn = fn(&RenderScene, Entity) -> Option<ComponentHandle>;
pub type SerializeFn = fn(&RenderScene, &mut Vec<ComponentRecord>);
pub type DeserializeFn = fn(&mut RenderScene, ComponentRecord, SceneVersion) -> Result<()>;

pub struct ComponentInfo {
    pub kind: ComponentKind,
    /// Stable name, used in persisted records
    pub name: &'static str,
    pub create: CreateFn,
    pub destroy: DestroyFn,
    pub lookup: LookupFn,
    pub serialize: SerializeFn,
    pub deserialize: DeserializeFn,
}

/// Lookup for kinds whose handle is the entity index
fn entity_handle(present: bool, entity: Entity) -> Option<ComponentHandle> {
    present.then(|| ComponentHandle::from_entity(entity))
}

macro_rules! emitter_module_info {
    ($kind:ident, $module:ident, $name:literal) => {
        ComponentInfo {
            kind: ComponentKind::$kind,
            name: $name,
            create: |scene, entity| scene.create_emitter_module(entity, EmitterModuleKind::$module),
            destroy: |scene, handle| scene.destroy_emitter_module(handle, EmitterModuleKind::$module),
            lookup: |scene, entity| {
                let handle = ComponentHandle::from_entity(entity);
                scene.emitter_module(handle, EmitterModuleKind::$module).map(|_| handle)
            },
            serialize: |scene, records| scene.serialize_emitter_modules(EmitterModuleKind::$module, records),
            deserialize: |scene, record, _| scene.deserialize_emitter_module(record),
        }
    };
}

static COMPONENT_INFOS: [ComponentInfo; 17] = [
    ComponentInfo {
        kind: ComponentKind::ModelInstance,
        name: "model_instance",
        create: |scene, entity| scene.create_model_instance(entity),
        destroy: |scene, handle| scene.destroy_model_instance(handle),
        lookup: |scene, entity| scene.model_instance_component(entity),
        serialize: |scene, records| scene.serialize_model_instances(records),
        deserialize: |scene, record, _| scene.deserialize_model_instance(record),
    },
    ComponentInfo {
        kind: ComponentKind::PointLight,
        name: "point_light",
        create: |scene, entity| scene.create_point_light(entity),
        destroy: |scene, handle| scene.destroy_point_light(handle),
        lookup: |scene, entity| scene.point_light_component(entity),
        serialize: |scene, records| scene.serialize_point_lights(records),
        deserialize: |scene, record, _| scene.deserialize_point_light(record),
    },
    ComponentInfo {
        kind: ComponentKind::GlobalLight,
        name: "global_light",
        create: |scene, entity| scene.create_global_light(entity),
        destroy: |scene, handle| scene.destroy_global_light(handle),
        lookup: |scene, entity| entity_handle(scene.global_lights.contains_key(&entity), entity),
        serialize: |scene, records| scene.serialize_global_lights(records),
        deserialize: |scene, record, version| scene.deserialize_global_light(record, version),
    },
    ComponentInfo {
        kind: ComponentKind::Decal,
        name: "decal",
        create: |scene, entity| scene.create_decal(entity),
        destroy: |scene, handle| scene.destroy_decal(handle),
        lookup: |scene, entity| entity_handle(scene.decals.contains_key(&entity), entity),
        serialize: |scene, records| scene.serialize_decals(records),
        deserialize: |scene, record, _| scene.deserialize_decal(record),
    },
    ComponentInfo {
        kind: ComponentKind::Camera,
        name: "camera",
        create: |scene, entity| scene.create_camera(entity),
        destroy: |scene, handle| scene.destroy_camera(handle),
        lookup: |scene, entity| entity_handle(scene.cameras.contains_key(&entity), entity),
        serialize: |scene, records| scene.serialize_cameras(records),
        deserialize: |scene, record, _| scene.deserialize_camera(record),
    },
    ComponentInfo {
        kind: ComponentKind::Terrain,
        name: "terrain",
        create: |scene, entity| scene.create_terrain(entity),
        destroy: |scene, handle| scene.destroy_terrain(handle),
        lookup: |scene, entity| entity_handle(scene.terrains.contains_key(&entity), entity),
        serialize: |scene, records| scene.serialize_terrains(records),
        deserialize: |scene, record, _| scene.deserialize_terrain(record),
    },
    ComponentInfo {
        kind: ComponentKind::EnvironmentProbe,
        name: "environment_probe",
        create: |scene, entity| scene.create_environment_probe(entity),
        destroy: |scene, handle| scene.destroy_environment_probe(handle),
        lookup: |scene, entity| entity_handle(scene.environment_probes.contains_key(&entity), entity),
        serialize: |scene, records| scene.serialize_environment_probes(records),
        deserialize: |scene, record, _| scene.deserialize_environment_probe(record),
    },
    ComponentInfo {
        kind: ComponentKind::ParticleEmitter,
        name: "particle_emitter",
        create: |scene, entity| scene.create_particle_emitter(entity),
        destroy: |scene, handle| scene.destroy_particle_emitter(handle),
        lookup: |scene, entity| {
            let valid = scene.particle_emitters.get(&entity).is_some_and(|emitter| emitter.is_valid());
            entity_handle(valid, entity)
        },
        serialize: |scene, records| scene.serialize_particle_emitters(records),
        deserialize: |scene, record, _| scene.deserialize_particle_emitter(record),
    },
    emitter_module_info!(EmitterAlpha, Alpha, "particle_emitter_alpha"),
    emitter_module_info!(EmitterAttractor, Attractor, "particle_emitter_attractor"),
    emitter_module_info!(EmitterForce, Force, "particle_emitter_force"),
    emitter_module_info!(EmitterLinearMovement, LinearMovement, "particle_emitter_linear_movement"),
    emitter_module_info!(EmitterPlane, Plane, "particle_emitter_plane"),
    emitter_module_info!(EmitterRandomRotation, RandomRotation, "particle_emitter_random_rotation"),
    emitter_module_info!(EmitterSize, Size, "particle_emitter_size"),
    emitter_module_info!(EmitterSpawnShape, SpawnShape, "particle_emitter_spawn_shape"),
    emitter_module_info!(EmitterSubimage, Subimage, "particle_emitter_subimage"),
];

// ============================================================================
// DIRECTORY API
// ============================================================================

impl RenderScene {
    /// Create a component of `kind` on `entity`.
    pub fn create_component(&mut self, kind: ComponentKind, entity: Entity) -> ComponentHandle {
        (kind.info().create)(self, entity)
    }

    /// Destroy a component. Returns false if it does not exist.
    pub fn destroy_component(&mut self, handle: ComponentHandle, kind: ComponentKind) -> bool {
        (kind.info().destroy)(self, handle)
    }

    /// Handle of the entity's component of `kind`.
    pub fn component(&self, entity: Entity, kind: ComponentKind) -> Option<ComponentHandle> {
        (kind.info().lookup)(self, entity)
    }

    pub fn has_component(&self, entity: Entity, kind: ComponentKind) -> bool {
        self.component(entity, kind).is_some()
    }

    /// Kinds of every component the entity has, in table order.
    pub fn component_kinds(&self, entity: Entity) -> Vec<ComponentKind> {
        ComponentKind::ALL
            .into_iter()
            .filter(|&kind| self.has_component(entity, kind))
            .collect()
    }

    /// Destroy every component of an entity (e.g. when the entity dies).
    pub fn destroy_entity_components(&mut self, entity: Entity) -> usize {
        let mut destroyed = 0;
        for kind in self.component_kinds(entity).into_iter().rev() {
            if let Some(handle) = self.component(entity, kind) {
                if self.destroy_component(handle, kind) {
                    destroyed += 1;
                }
            }
        }
        destroyed
    }
}

#[cfg(test)]
#[path = "component_tests.rs"]
mod tests;
