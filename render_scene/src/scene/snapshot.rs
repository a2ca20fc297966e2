/// Scene snapshots.
///
/// A snapshot is a versioned list of component records, one per
/// component, written kind by kind in directory order. Point lights are
/// written in storage order together with the handle counter, so a restore
/// rebuilds the same handles in the same slots.
///
/// Versions:
/// - `GrassRotationMode`: global light records carry a leftover `component` field
/// - `GlobalLightRefactor`: the field is gone
/// - `Latest`: adds the active global light to the snapshot header

use glam::Vec3;
use serde::{Deserialize, Serialize};
use crate::camera::Camera;
use crate::error::{Error, Result};
use crate::universe::{ComponentHandle, Entity};
use crate::{prism_error, prism_info};
use super::component::ComponentKind;
use super::environment_probe::EnvironmentProbe;
use super::global_light::GlobalLight;
use super::model_instance::SubmeshList;
use super::particle_emitter::{EmitterModule, EmitterModuleKind, ParticleEmitter};
use super::point_light::PointLight;
use super::render_scene::{RenderScene, SOURCE};
use super::terrain::Terrain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u32)]
pub enum SceneVersion {
    GrassRotationMode = 0,
    GlobalLightRefactor = 1,
    Latest = 2,
}

impl SceneVersion {
    pub fn from_u32(version: u32) -> Option<Self> {
        match version {
            0 => Some(SceneVersion::GrassRotationMode),
            1 => Some(SceneVersion::GlobalLightRefactor),
            2 => Some(SceneVersion::Latest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub version: u32,
    /// Next point light handle to allocate
    pub point_light_next_handle: u32,
    #[serde(default)]
    pub active_global_light: Option<Entity>,
    pub records: Vec<ComponentRecord>,
}

impl SceneSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ComponentRecord {
    ModelInstance {
        entity: Entity,
        /// Model path, empty without model
        path: String,
        /// Material path per submesh of an instance with overrides
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        materials: Vec<String>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        hidden: bool,
    },
    PointLight(PointLight),
    GlobalLight {
        #[serde(flatten)]
        light: GlobalLight,
        /// Leftover of old layouts, ignored
        #[serde(default, skip_serializing_if = "Option::is_none")]
        component: Option<u32>,
    },
    Decal {
        entity: Entity,
        material: String,
        scale: Vec3,
    },
    Camera(Camera),
    Terrain(Terrain),
    EnvironmentProbe(EnvironmentProbe),
    ParticleEmitter(ParticleEmitter),
    EmitterModule {
        entity: Entity,
        module: EmitterModule,
    },
}

impl ComponentRecord {
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentRecord::ModelInstance { .. } => ComponentKind::ModelInstance,
            ComponentRecord::PointLight(_) => ComponentKind::PointLight,
            ComponentRecord::GlobalLight { .. } => ComponentKind::GlobalLight,
            ComponentRecord::Decal { .. } => ComponentKind::Decal,
            ComponentRecord::Camera(_) => ComponentKind::Camera,
            ComponentRecord::Terrain(_) => ComponentKind::Terrain,
            ComponentRecord::EnvironmentProbe(_) => ComponentKind::EnvironmentProbe,
            ComponentRecord::ParticleEmitter(_) => ComponentKind::ParticleEmitter,
            ComponentRecord::EmitterModule { module, .. } => module.kind().into(),
        }
    }
}

fn mismatch(expected: ComponentKind, record: &ComponentRecord) -> Error {
    Error::Serialization(format!("expected a {} record, got {}", expected.name(), record.kind().name()))
}

/// Sorted copy of a map's keys, for deterministic output
fn sorted_entities<'a>(entities: impl Iterator<Item = &'a Entity>) -> Vec<Entity> {
    let mut entities: Vec<Entity> = entities.copied().collect();
    entities.sort_unstable();
    entities
}

impl RenderScene {
    /// Capture every component of the scene.
    pub fn snapshot(&self) -> SceneSnapshot {
        let mut records = Vec::new();
        for kind in ComponentKind::ALL {
            (kind.info().serialize)(self, &mut records);
        }

        SceneSnapshot {
            version: SceneVersion::Latest as u32,
            point_light_next_handle: self.point_lights.next_handle(),
            active_global_light: self.active_global_light,
            records,
        }
    }

    /// Replace the scene's contents with a snapshot.
    ///
    /// Components are recreated through the directory, then every light's
    /// influence list is rebuilt. A failing record aborts the restore and
    /// leaves the scene partially restored.
    pub fn restore(&mut self, snapshot: SceneSnapshot) -> Result<()> {
        let Some(version) = SceneVersion::from_u32(snapshot.version) else {
            prism_error!(SOURCE, "Unsupported scene version {}", snapshot.version);
            return Err(Error::UnsupportedVersion(snapshot.version));
        };

        self.clear();

        let record_count = snapshot.records.len();
        for record in snapshot.records {
            let kind = record.kind();
            if let Err(err) = (kind.info().deserialize)(self, record, version) {
                prism_error!(SOURCE, "Failed to restore {} record: {}", kind.name(), err);
                return Err(err);
            }
        }

        self.point_lights.set_next_handle(snapshot.point_light_next_handle);
        if version >= SceneVersion::Latest {
            self.set_active_global_light(snapshot.active_global_light.map(ComponentHandle::from_entity));
        }
        self.rebuild_light_influence();

        prism_info!(SOURCE, "Restored {} components (version {:?})", record_count, version);
        Ok(())
    }

    // ===== MODEL INSTANCES =====

    pub(super) fn serialize_model_instances(&self, records: &mut Vec<ComponentRecord>) {
        for (_, instance) in self.model_instances() {
            let materials = match instance.meshes() {
                SubmeshList::Owned(meshes) => meshes.iter().map(|mesh| mesh.material_path().to_string()).collect(),
                _ => Vec::new(),
            };
            records.push(ComponentRecord::ModelInstance {
                entity: instance.entity(),
                path: instance.model().map(|model| model.path().to_string()).unwrap_or_default(),
                materials,
                hidden: !instance.is_visible(),
            });
        }
    }

    pub(super) fn deserialize_model_instance(&mut self, record: ComponentRecord) -> Result<()> {
        let (entity, path, materials, hidden) = match record {
            ComponentRecord::ModelInstance { entity, path, materials, hidden } => (entity, path, materials, hidden),
            other => return Err(mismatch(ComponentKind::ModelInstance, &other)),
        };

        let handle = self.create_model_instance(entity);
        if hidden {
            self.hide_model_instance(handle);
        }
        self.set_model_instance_path(handle, &path);
        for (index, material) in materials.iter().enumerate() {
            if !material.is_empty() {
                self.set_model_instance_material(handle, index, material);
            }
        }
        Ok(())
    }

    // ===== LIGHTS =====

    pub(super) fn serialize_point_lights(&self, records: &mut Vec<ComponentRecord>) {
        records.extend(self.point_lights.iter().cloned().map(ComponentRecord::PointLight));
    }

    pub(super) fn deserialize_point_light(&mut self, record: ComponentRecord) -> Result<()> {
        let light = match record {
            ComponentRecord::PointLight(light) => light,
            other => return Err(mismatch(ComponentKind::PointLight, &other)),
        };
        self.insert_point_light(light);
        Ok(())
    }

    pub(super) fn serialize_global_lights(&self, records: &mut Vec<ComponentRecord>) {
        for entity in sorted_entities(self.global_lights.keys()) {
            if let Some(light) = self.global_lights.get(&entity) {
                records.push(ComponentRecord::GlobalLight { light: light.clone(), component: None });
            }
        }
    }

    /// The last global light read becomes active; `restore` then applies
    /// the snapshot's active light for current versions.
    pub(super) fn deserialize_global_light(&mut self, record: ComponentRecord, version: SceneVersion) -> Result<()> {
        let (light, component) = match record {
            ComponentRecord::GlobalLight { light, component } => (light, component),
            other => return Err(mismatch(ComponentKind::GlobalLight, &other)),
        };
        if version < SceneVersion::GlobalLightRefactor || component.is_some() {
            prism_info!(SOURCE, "Global light of entity {} uses the pre-refactor layout", light.entity.0);
        }
        self.insert_global_light(light);
        Ok(())
    }

    // ===== SATELLITES =====

    pub(super) fn serialize_decals(&self, records: &mut Vec<ComponentRecord>) {
        for entity in sorted_entities(self.decals.keys()) {
            if let Some(decal) = self.decals.get(&entity) {
                records.push(ComponentRecord::Decal {
                    entity,
                    material: decal.material_path().to_string(),
                    scale: decal.scale(),
                });
            }
        }
    }

    pub(super) fn deserialize_decal(&mut self, record: ComponentRecord) -> Result<()> {
        let (entity, material, scale) = match record {
            ComponentRecord::Decal { entity, material, scale } => (entity, material, scale),
            other => return Err(mismatch(ComponentKind::Decal, &other)),
        };
        let handle = self.create_decal(entity);
        self.set_decal_scale(handle, scale);
        self.set_decal_material_path(handle, &material);
        Ok(())
    }

    pub(super) fn serialize_cameras(&self, records: &mut Vec<ComponentRecord>) {
        for entity in sorted_entities(self.cameras.keys()) {
            if let Some(camera) = self.cameras.get(&entity) {
                records.push(ComponentRecord::Camera(camera.clone()));
            }
        }
    }

    pub(super) fn deserialize_camera(&mut self, record: ComponentRecord) -> Result<()> {
        let camera = match record {
            ComponentRecord::Camera(camera) => camera,
            other => return Err(mismatch(ComponentKind::Camera, &other)),
        };
        self.cameras.insert(camera.entity, camera);
        Ok(())
    }

    pub(super) fn serialize_terrains(&self, records: &mut Vec<ComponentRecord>) {
        for entity in sorted_entities(self.terrains.keys()) {
            if let Some(terrain) = self.terrains.get(&entity) {
                records.push(ComponentRecord::Terrain(terrain.clone()));
            }
        }
    }

    pub(super) fn deserialize_terrain(&mut self, record: ComponentRecord) -> Result<()> {
        let terrain = match record {
            ComponentRecord::Terrain(terrain) => terrain,
            other => return Err(mismatch(ComponentKind::Terrain, &other)),
        };
        self.terrains.insert(terrain.entity, terrain);
        Ok(())
    }

    pub(super) fn serialize_environment_probes(&self, records: &mut Vec<ComponentRecord>) {
        for entity in sorted_entities(self.environment_probes.keys()) {
            if let Some(probe) = self.environment_probes.get(&entity) {
                records.push(ComponentRecord::EnvironmentProbe(probe.clone()));
            }
        }
    }

    pub(super) fn deserialize_environment_probe(&mut self, record: ComponentRecord) -> Result<()> {
        let probe = match record {
            ComponentRecord::EnvironmentProbe(probe) => probe,
            other => return Err(mismatch(ComponentKind::EnvironmentProbe, &other)),
        };
        self.environment_probes.insert(probe.entity, probe);
        Ok(())
    }

    // ===== PARTICLE EMITTERS =====

    pub(super) fn serialize_particle_emitters(&self, records: &mut Vec<ComponentRecord>) {
        for entity in sorted_entities(self.particle_emitters.keys()) {
            if let Some(emitter) = self.particle_emitters.get(&entity).filter(|e| e.is_valid()) {
                records.push(ComponentRecord::ParticleEmitter(emitter.clone()));
            }
        }
    }

    pub(super) fn deserialize_particle_emitter(&mut self, record: ComponentRecord) -> Result<()> {
        let emitter = match record {
            ComponentRecord::ParticleEmitter(emitter) => emitter,
            other => return Err(mismatch(ComponentKind::ParticleEmitter, &other)),
        };
        self.insert_particle_emitter(emitter);
        Ok(())
    }

    pub(super) fn serialize_emitter_modules(&self, kind: EmitterModuleKind, records: &mut Vec<ComponentRecord>) {
        for entity in sorted_entities(self.particle_emitters.keys()) {
            let module = self.particle_emitters.get(&entity).and_then(|emitter| emitter.module(kind));
            if let Some(module) = module {
                records.push(ComponentRecord::EmitterModule { entity, module: module.clone() });
            }
        }
    }

    pub(super) fn deserialize_emitter_module(&mut self, record: ComponentRecord) -> Result<()> {
        let (entity, module) = match record {
            ComponentRecord::EmitterModule { entity, module } => (entity, module),
            other => {
                return Err(Error::Serialization(format!(
                    "expected an emitter module record, got {}",
                    other.kind().name()
                )))
            }
        };
        self.insert_emitter_module(entity, module);
        Ok(())
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
