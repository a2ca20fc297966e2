/// RenderScene: renderable and light components attached to entities.
///
/// The scene keeps several containers consistent with each other:
/// - model instances (dense, indexed by entity) and the spatial index
/// - point lights (dense, swap-removed) and the per-light influence lists
/// - satellite stores (decals, cameras, terrains, probes, emitters)
///
/// Transforms are owned by the universe. The scene caches what it needs
/// and refreshes it in `update()`, which drains moved entities and asset
/// events once per frame.
///
/// Mutation takes `&mut self`; queries take `&self` and may fan out on the
/// scene's worker pool.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use rayon::{ThreadPool, ThreadPoolBuilder};
use rustc_hash::FxHashMap;
use crate::camera::Camera;
use crate::culling::SpatialIndex;
use crate::error::{Error, Result};
use crate::resource::{AssetEvent, AssetManager};
use crate::universe::{ComponentHandle, Entity, Universe};
use crate::{prism_debug, prism_trace};
use super::asset_subscriptions::AssetSubscriptions;
use super::config::RenderSceneConfig;
use super::decal::Decal;
use super::environment_probe::EnvironmentProbe;
use super::global_light::GlobalLight;
use super::light_influence::LightInfluenceCache;
use super::model_instance::ModelInstance;
use super::particle_emitter::ParticleEmitter;
use super::point_light::PointLightStore;
use super::terrain::Terrain;

pub(crate) const SOURCE: &str = "prism::RenderScene";

/// Lock the shared asset manager, ignoring poisoning.
pub(crate) fn lock_assets<'a>(
    assets: &'a Mutex<dyn AssetManager + 'static>,
) -> MutexGuard<'a, dyn AssetManager + 'static> {
    assets.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct RenderScene {
    pub(super) config: RenderSceneConfig,
    pub(super) universe: Arc<dyn Universe>,
    pub(super) assets: Arc<Mutex<dyn AssetManager>>,
    pub(super) spatial_index: Box<dyn SpatialIndex>,
    /// Worker pool for culling and LOD jobs
    pub(super) pool: ThreadPool,

    /// Model instances indexed by entity (None = no component)
    pub(super) model_instances: Vec<Option<ModelInstance>>,
    pub(super) model_instance_count: usize,
    /// One asset subscription per distinct referenced model
    pub(super) subscriptions: AssetSubscriptions,
    /// Model instances created since the last take_created_model_instances()
    pub(super) created_model_instances: Vec<ComponentHandle>,
    /// Model instances destroyed since the last take_destroyed_model_instances()
    pub(super) destroyed_model_instances: Vec<ComponentHandle>,

    pub(super) point_lights: PointLightStore,
    /// Influence lists, parallel to point light slots
    pub(super) light_influence: LightInfluenceCache,
    pub(super) global_lights: FxHashMap<Entity, GlobalLight>,
    pub(super) active_global_light: Option<Entity>,

    pub(super) decals: FxHashMap<Entity, Decal>,
    pub(super) cameras: FxHashMap<Entity, Camera>,
    pub(super) terrains: FxHashMap<Entity, Terrain>,
    pub(super) environment_probes: FxHashMap<Entity, EnvironmentProbe>,
    pub(super) particle_emitters: FxHashMap<Entity, ParticleEmitter>,
}

impl RenderScene {
    /// Create an empty scene.
    ///
    /// # Arguments
    ///
    /// * `config` - Worker pool size, LOD tuning and capacities
    /// * `universe` - Source of entity transforms and moved-entity notifications
    /// * `assets` - Asset manager models and materials are loaded through
    /// * `spatial_index` - Spatial index the scene becomes the only writer of
    pub fn new(
        config: RenderSceneConfig,
        universe: Arc<dyn Universe>,
        assets: Arc<Mutex<dyn AssetManager>>,
        spatial_index: Box<dyn SpatialIndex>,
    ) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(|index| format!("prism-worker-{}", index))
            .build()
            .map_err(|err| Error::InitializationFailed(format!("worker pool: {}", err)))?;

        prism_debug!(SOURCE, "Render scene created with {} workers", pool.current_num_threads());

        Ok(Self {
            model_instances: Vec::with_capacity(config.model_instance_capacity),
            config,
            universe,
            assets,
            spatial_index,
            pool,
            model_instance_count: 0,
            subscriptions: AssetSubscriptions::default(),
            created_model_instances: Vec::new(),
            destroyed_model_instances: Vec::new(),
            point_lights: PointLightStore::default(),
            light_influence: LightInfluenceCache::default(),
            global_lights: FxHashMap::default(),
            active_global_light: None,
            decals: FxHashMap::default(),
            cameras: FxHashMap::default(),
            terrains: FxHashMap::default(),
            environment_probes: FxHashMap::default(),
            particle_emitters: FxHashMap::default(),
        })
    }

    // ===== GETTERS =====

    pub fn config(&self) -> &RenderSceneConfig {
        &self.config
    }

    pub fn universe(&self) -> &Arc<dyn Universe> {
        &self.universe
    }

    pub fn spatial_index(&self) -> &dyn SpatialIndex {
        self.spatial_index.as_ref()
    }

    pub fn lod_multiplier(&self) -> f32 {
        self.config.lod_multiplier
    }

    pub fn set_lod_multiplier(&mut self, multiplier: f32) {
        self.config.lod_multiplier = multiplier;
    }

    // ===== FRAME UPDATE =====

    /// Apply pending invalidations: moved entities, then asset events.
    pub fn update(&mut self) {
        let moved = self.universe.take_moved_entities();
        for &entity in &moved {
            self.on_entity_moved(entity);
        }

        let events = lock_assets(&self.assets).drain_events();
        for event in &events {
            match event {
                AssetEvent::Ready(model) => self.on_asset_ready(model),
                AssetEvent::Unloaded(model) => self.on_asset_unloaded(model),
            }
        }

        if !moved.is_empty() || !events.is_empty() {
            prism_trace!(SOURCE, "Update: {} moved entities, {} asset events", moved.len(), events.len());
        }
    }

    /// Refresh everything cached from an entity's transform.
    pub fn on_entity_moved(&mut self, entity: Entity) {
        let handle = ComponentHandle::from_entity(entity);
        if self.model_instance(handle).is_some_and(ModelInstance::is_ready) {
            self.update_model_instance_transform(handle);
            self.retest_light_influence(handle);
        }

        if self.decals.contains_key(&entity) {
            self.update_decal(entity);
        }

        if let Some(light) = self.point_lights.handle_of(entity) {
            self.detect_light_influenced_geometry(light);
        }
    }

    /// Destroy every component in the scene, releasing their assets.
    pub fn clear(&mut self) {
        let entities: Vec<Entity> = self.model_instances.iter().flatten().map(|i| i.entity()).collect();
        for entity in entities {
            self.destroy_model_instance(ComponentHandle::from_entity(entity));
        }
        self.model_instances.clear();

        let decals: Vec<Entity> = self.decals.keys().copied().collect();
        for entity in decals {
            self.destroy_decal(ComponentHandle::from_entity(entity));
        }

        self.point_lights = PointLightStore::default();
        self.light_influence = LightInfluenceCache::default();
        self.global_lights.clear();
        self.active_global_light = None;
        self.cameras.clear();
        self.terrains.clear();
        self.environment_probes.clear();
        self.particle_emitters.clear();
        self.spatial_index.clear();
    }
}

#[cfg(test)]
#[path = "render_scene_tests.rs"]
mod tests;
