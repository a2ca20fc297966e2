//! Scene module
//!
//! `RenderScene` stores the components of renderable entities (model
//! instances, lights, decals, cameras, terrains, probes, particle
//! emitters), keeps the spatial index and light influence lists in sync
//! with entity transforms and asset readiness, and answers per-frame
//! visibility queries.

mod asset_subscriptions;
mod cameras;
mod component;
mod config;
mod decal;
mod environment_probe;
mod global_light;
mod light_influence;
mod model_instance;
mod particle_emitter;
mod point_light;
mod render_scene;
mod snapshot;
mod terrain;
mod visibility;

pub use cameras::MAIN_CAMERA_SLOT;
pub use component::{
    ComponentInfo, ComponentKind,
    CreateFn, DestroyFn, LookupFn, SerializeFn, DeserializeFn,
};
pub use config::RenderSceneConfig;
pub use decal::{Decal, DecalInfo};
pub use environment_probe::EnvironmentProbe;
pub use global_light::GlobalLight;
pub use model_instance::{ModelInstance, ModelInstanceKind, SubmeshList, MAX_MATERIAL_OVERRIDES};
pub use particle_emitter::{
    EmitterModule, EmitterModuleKind, EntityList, ParticleEmitter,
    MAX_MODULE_ENTITIES, MIN_SPAWN_PERIOD,
};
pub use point_light::PointLight;
pub use render_scene::RenderScene;
pub use snapshot::{ComponentRecord, SceneSnapshot, SceneVersion};
pub use terrain::Terrain;
pub use visibility::ModelInstanceMesh;

#[cfg(test)]
pub(crate) mod test_utils {
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
    use glam::{Quat, Vec3};
    use crate::culling::{LinearSpatialIndex, SpatialIndex};
    use crate::resource::{
        AssetManager, Bone, Lod, MaterialDesc, MeshDesc, Model, ModelDesc, ResourceManager,
    };
    use crate::universe::{ComponentHandle, Entity, World};
    use super::{RenderScene, RenderSceneConfig};

    /// Scene wired to an in-memory world and resource manager.
    pub(crate) struct Fixture {
        pub(crate) world: Arc<World>,
        pub(crate) assets: Arc<Mutex<ResourceManager>>,
        pub(crate) scene: RenderScene,
    }

    impl Fixture {
        pub(crate) fn new() -> Self {
            Self::with_index(Box::new(LinearSpatialIndex::new(4)))
        }

        pub(crate) fn with_index(spatial_index: Box<dyn SpatialIndex>) -> Self {
            let world = Arc::new(World::new());
            let assets = Arc::new(Mutex::new(ResourceManager::new()));
            let config = RenderSceneConfig { worker_threads: 2, ..RenderSceneConfig::default() };
            let scene = RenderScene::new(config, world.clone(), assets.clone(), spatial_index)
                .expect("scene");
            Self { world, assets, scene }
        }

        pub(crate) fn resources(&self) -> MutexGuard<'_, ResourceManager> {
            self.assets.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Load a model and deliver its contents right away.
        pub(crate) fn ready_model(&self, path: &str, desc: ModelDesc) -> Arc<Model> {
            let mut resources = self.resources();
            let model = resources.load_model(path);
            resources.finish_model_load(path, desc).expect("model load");
            model
        }

        /// Entity at `position` with a model instance bound to a ready model.
        pub(crate) fn spawn(&mut self, position: Vec3, path: &str, desc: ModelDesc) -> (Entity, ComponentHandle) {
            let entity = self.world.create_entity_at(position);
            let handle = self.scene.create_model_instance(entity);
            let model = self.ready_model(path, desc);
            self.scene.set_model_instance_model(handle, Some(model));
            (entity, handle)
        }
    }

    pub(crate) fn mesh(name: &str, material: &str) -> MeshDesc {
        MeshDesc { name: name.into(), material: material.into() }
    }

    /// Rigid model with one mesh per material.
    pub(crate) fn model_desc(bounding_radius: f32, materials: &[&str]) -> ModelDesc {
        ModelDesc {
            bounding_radius,
            bones: Vec::new(),
            meshes: materials
                .iter()
                .enumerate()
                .map(|(i, material)| mesh(&format!("mesh{}", i), material))
                .collect(),
            lods: Vec::new(),
        }
    }

    pub(crate) fn skinned_desc(bounding_radius: f32, bone_count: usize) -> ModelDesc {
        ModelDesc {
            bones: (0..bone_count)
                .map(|i| Bone {
                    name: format!("bone{}", i),
                    position: Vec3::new(0.0, i as f32, 0.0),
                    rotation: Quat::IDENTITY,
                })
                .collect(),
            ..model_desc(bounding_radius, &["skin.mat"])
        }
    }

    /// Three meshes, one LOD each: [0] below 10, [1] below 100, [2] beyond.
    pub(crate) fn lod_desc(bounding_radius: f32) -> ModelDesc {
        ModelDesc {
            lods: vec![
                Lod { to_mesh: 0, distance: 10.0 },
                Lod { to_mesh: 1, distance: 100.0 },
                Lod { to_mesh: 2, distance: f32::MAX },
            ],
            ..model_desc(bounding_radius, &["lod0.mat", "lod1.mat", "lod2.mat"])
        }
    }

    pub(crate) fn layered_material() -> MaterialDesc {
        MaterialDesc { layer_count: 2, ..MaterialDesc::default() }
    }
}
