/// Model instances: the renderable registry.
///
/// A model instance binds an entity to a model. It is created empty, is
/// populated when its model becomes ready (pose, submesh list, spatial
/// entry, light influence) and is torn down again on unload, model
/// replacement or destruction.
///
/// Submeshes alias the model's shared array until a material is overridden
/// on the instance; from then on the instance owns a private copy holding
/// one material reference per bound slot.

use std::sync::Arc;
use glam::{Mat4, Vec3};
use crate::culling::{LayerMask, Sphere};
use crate::resource::{AssetManager, Mesh, Model, ModelData, Pose};
use crate::universe::{ComponentHandle, Entity};
use crate::{prism_debug, prism_warn};
use super::render_scene::{lock_assets, RenderScene, SOURCE};

/// Number of submesh slots a model instance can override.
pub const MAX_MATERIAL_OVERRIDES: usize = 128;

// ============================================================================
// TYPES
// ============================================================================

/// Rendering path of a model instance, decided when its model loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelInstanceKind {
    #[default]
    Rigid,
    /// Model has bones
    Skinned,
    /// First submesh material has blend layers
    Multilayer,
}

/// Submesh list of a model instance
#[derive(Debug, Clone, Default)]
pub enum SubmeshList {
    /// Model not ready, no overrides
    #[default]
    Empty,
    /// The model's own submesh array, never mutated
    Shared(Arc<[Mesh]>),
    /// Private copy with per-instance material overrides
    Owned(Vec<Mesh>),
}

impl SubmeshList {
    pub fn as_slice(&self) -> &[Mesh] {
        match self {
            SubmeshList::Empty => &[],
            SubmeshList::Shared(meshes) => meshes,
            SubmeshList::Owned(meshes) => meshes,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, SubmeshList::Owned(_))
    }

    /// Union of the submesh materials' layer masks.
    pub fn layer_mask(&self) -> LayerMask {
        self.as_slice()
            .iter()
            .filter_map(Mesh::material)
            .fold(LayerMask::empty(), |mask, material| mask | material.layer_mask())
    }
}

/// Per-renderable record
#[derive(Debug)]
pub struct ModelInstance {
    pub(super) entity: Entity,
    /// Cached world matrix of the entity
    pub(super) matrix: Mat4,
    pub(super) model: Option<Arc<Model>>,
    /// Model contents this instance was populated from (None until ready)
    pub(super) data: Option<Arc<ModelData>>,
    pub(super) meshes: SubmeshList,
    /// Present only when the model is loaded and has bones
    pub(super) pose: Option<Pose>,
    pub(super) kind: ModelInstanceKind,
    /// Hidden instances keep their data but have no spatial entry
    pub(super) visible: bool,
}

impl ModelInstance {
    fn new(entity: Entity, matrix: Mat4) -> Self {
        Self {
            entity,
            matrix,
            model: None,
            data: None,
            meshes: SubmeshList::Empty,
            pose: None,
            kind: ModelInstanceKind::Rigid,
            visible: true,
        }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    pub fn position(&self) -> Vec3 {
        self.matrix.w_axis.truncate()
    }

    pub fn model(&self) -> Option<&Arc<Model>> {
        self.model.as_ref()
    }

    pub fn data(&self) -> Option<&Arc<ModelData>> {
        self.data.as_ref()
    }

    /// Whether the instance was populated from a loaded model
    pub fn is_ready(&self) -> bool {
        self.data.is_some()
    }

    pub fn meshes(&self) -> &SubmeshList {
        &self.meshes
    }

    pub fn pose(&self) -> Option<&Pose> {
        self.pose.as_ref()
    }

    pub fn kind(&self) -> ModelInstanceKind {
        self.kind
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

// ============================================================================
// SUBMESH OWNERSHIP
// ============================================================================

/// Give the instance an owned submesh list of exactly `count` slots.
///
/// Switching from shared to owned takes a reference on every copied
/// material; shrinking an owned list releases the dropped slots'
/// materials. New slots start unbound.
fn allocate_custom_meshes(meshes: &mut SubmeshList, count: usize, assets: &mut dyn AssetManager) {
    let mut list = match std::mem::take(meshes) {
        SubmeshList::Owned(mut list) => {
            if list.len() > count {
                for mesh in list.drain(count..) {
                    if let Some(material) = mesh.material() {
                        assets.unload_material(material);
                    }
                }
            }
            list
        }
        SubmeshList::Shared(shared) => {
            let list: Vec<Mesh> = shared.iter().take(count).cloned().collect();
            for material in list.iter().filter_map(Mesh::material) {
                assets.add_material_ref(material);
            }
            list
        }
        SubmeshList::Empty => Vec::new(),
    };

    list.resize_with(count, Mesh::default);
    *meshes = SubmeshList::Owned(list);
}

/// Release an owned submesh list's material references.
fn free_custom_meshes(meshes: &mut SubmeshList, assets: &mut dyn AssetManager) {
    if let SubmeshList::Owned(list) = std::mem::take(meshes) {
        for material in list.iter().filter_map(Mesh::material) {
            assets.unload_material(material);
        }
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

impl RenderScene {
    pub(super) fn model_instance_mut(&mut self, handle: ComponentHandle) -> Option<&mut ModelInstance> {
        self.model_instances.get_mut(handle.index()).and_then(Option::as_mut)
    }

    /// Model instance record, `None` if the handle names no live instance.
    pub fn model_instance(&self, handle: ComponentHandle) -> Option<&ModelInstance> {
        self.model_instances.get(handle.index()).and_then(Option::as_ref)
    }

    /// Model instance of an entity.
    pub fn model_instance_component(&self, entity: Entity) -> Option<ComponentHandle> {
        let handle = ComponentHandle::from_entity(entity);
        self.model_instance(handle).map(|_| handle)
    }

    pub fn model_instance_count(&self) -> usize {
        self.model_instance_count
    }

    /// Iterate over live model instances.
    pub fn model_instances(&self) -> impl Iterator<Item = (ComponentHandle, &ModelInstance)> + '_ {
        self.model_instances
            .iter()
            .flatten()
            .map(|instance| (ComponentHandle::from_entity(instance.entity), instance))
    }

    /// Create an empty model instance on an entity. The handle equals the
    /// entity index; an existing instance is returned unchanged.
    pub fn create_model_instance(&mut self, entity: Entity) -> ComponentHandle {
        let handle = ComponentHandle::from_entity(entity);
        if self.model_instance(handle).is_some() {
            prism_warn!(SOURCE, "Entity {} already has a model instance", entity.0);
            return handle;
        }

        if self.model_instances.len() <= entity.index() {
            self.model_instances.resize_with(entity.index() + 1, || None);
        }
        let matrix = self.universe.matrix(entity);
        self.model_instances[entity.index()] = Some(ModelInstance::new(entity, matrix));
        self.model_instance_count += 1;
        self.created_model_instances.push(handle);

        prism_debug!(SOURCE, "Model instance created on entity {}", entity.0);
        handle
    }

    /// Destroy a model instance, releasing its model, materials, pose,
    /// spatial entry and light influence mentions.
    pub fn destroy_model_instance(&mut self, handle: ComponentHandle) -> bool {
        if self.model_instance(handle).is_none() {
            prism_warn!(SOURCE, "Destroying unknown model instance {}", handle.0);
            return false;
        }

        self.set_model_instance_model(handle, None);

        let assets = self.assets.clone();
        if let Some(instance) = self.model_instance_mut(handle) {
            free_custom_meshes(&mut instance.meshes, &mut *lock_assets(&assets));
        }

        self.light_influence.remove_everywhere(handle);
        self.spatial_index.remove_static(handle);
        self.model_instances[handle.index()] = None;
        self.model_instance_count -= 1;
        self.destroyed_model_instances.push(handle);

        prism_debug!(SOURCE, "Model instance {} destroyed", handle.0);
        true
    }

    /// Drain model instances created since the previous call.
    pub fn take_created_model_instances(&mut self) -> Vec<ComponentHandle> {
        std::mem::take(&mut self.created_model_instances)
    }

    /// Drain model instances destroyed since the previous call.
    pub fn take_destroyed_model_instances(&mut self) -> Vec<ComponentHandle> {
        std::mem::take(&mut self.destroyed_model_instances)
    }

    // ===== MODEL BINDING =====

    /// Bind a model to an instance, taking ownership of one model reference.
    ///
    /// The previous model is released (owned submeshes, subscription,
    /// spatial entry, reference). If the new model is already ready the
    /// instance is populated immediately, otherwise on its ready event.
    /// Binding the model already bound only drops the extra reference.
    pub fn set_model_instance_model(&mut self, handle: ComponentHandle, model: Option<Arc<Model>>) -> bool {
        let assets = self.assets.clone();
        let mut assets = lock_assets(&assets);

        let Some(instance) = self.model_instances.get_mut(handle.index()).and_then(Option::as_mut) else {
            if let Some(model) = &model {
                assets.unload_model(model);
            }
            return false;
        };

        if let (Some(old), Some(new)) = (&instance.model, &model) {
            if Arc::ptr_eq(old, new) {
                assets.unload_model(new);
                return true;
            }
        }

        let was_ready = instance.data.is_some();
        if let Some(old) = instance.model.take() {
            free_custom_meshes(&mut instance.meshes, &mut *assets);
            self.subscriptions.release(&old, &mut *assets);
            assets.unload_model(&old);
        }

        instance.data = None;
        instance.pose = None;
        instance.kind = ModelInstanceKind::Rigid;
        instance.model = model.clone();

        if was_ready {
            self.spatial_index.remove_static(handle);
            self.light_influence.remove_everywhere(handle);
        }

        let Some(model) = model else {
            return true;
        };
        self.subscriptions.acquire(&model, &mut *assets);
        drop(assets);

        if model.is_ready() {
            self.model_instance_loaded(handle);
        }
        true
    }

    /// Load a model by path and bind it. An empty path unbinds the model.
    pub fn set_model_instance_path(&mut self, handle: ComponentHandle, path: &str) -> bool {
        if self.model_instance(handle).is_none() {
            return false;
        }
        let model = if path.is_empty() {
            None
        } else {
            Some(lock_assets(&self.assets).load_model(path))
        };
        self.set_model_instance_model(handle, model)
    }

    /// Path of the bound model, `None` without model.
    pub fn model_instance_path(&self, handle: ComponentHandle) -> Option<&str> {
        self.model_instance(handle)?.model.as_deref().map(Model::path)
    }

    // ===== MATERIAL OVERRIDES =====

    /// Override the material of submesh `index`.
    ///
    /// The first override switches the instance to an owned submesh list
    /// sized to cover `index`. Setting the material a slot already has is
    /// a no-op. Indices from `MAX_MATERIAL_OVERRIDES` on are refused.
    pub fn set_model_instance_material(&mut self, handle: ComponentHandle, index: usize, path: &str) -> bool {
        let Some(count) = index.checked_add(1).filter(|&count| count <= MAX_MATERIAL_OVERRIDES) else {
            prism_warn!(SOURCE, "Material override index {} out of range for model instance {}", index, handle.0);
            return false;
        };

        let assets = self.assets.clone();
        let mut assets = lock_assets(&assets);

        let Some(instance) = self.model_instances.get_mut(handle.index()).and_then(Option::as_mut) else {
            return false;
        };

        let current = instance.meshes.as_slice().get(index).and_then(Mesh::material);
        if current.is_some_and(|material| material.path() == path) {
            return true;
        }

        let count = instance.meshes.len().max(count);
        allocate_custom_meshes(&mut instance.meshes, count, &mut *assets);

        let material = assets.load_material(path);
        if let SubmeshList::Owned(list) = &mut instance.meshes {
            if let Some(previous) = list[index].material() {
                assets.unload_material(previous);
            }
            list[index].set_material(Some(material));
        }

        let layer_mask = instance.meshes.layer_mask();
        drop(assets);

        // The layer mask is part of the spatial entry
        if let Some(sphere) = self.spatial_index.sphere(handle) {
            self.spatial_index.add_static(handle, sphere, layer_mask);
        }
        true
    }

    /// Material path of submesh `index`, `None` when out of range or unbound.
    pub fn model_instance_material(&self, handle: ComponentHandle, index: usize) -> Option<&str> {
        let mesh = self.model_instance(handle)?.meshes.as_slice().get(index)?;
        mesh.material().map(|material| material.path())
    }

    pub fn model_instance_material_count(&self, handle: ComponentHandle) -> usize {
        self.model_instance(handle).map_or(0, |instance| instance.meshes.len())
    }

    // ===== VISIBILITY =====

    /// Re-add a hidden instance to the spatial index (if its model is ready).
    pub fn show_model_instance(&mut self, handle: ComponentHandle) -> bool {
        let Some(instance) = self.model_instance_mut(handle) else {
            return false;
        };
        instance.visible = true;
        let ready = instance.is_ready();

        if ready && !self.spatial_index.is_added(handle) {
            self.add_spatial_entry(handle);
            self.retest_light_influence(handle);
        }
        true
    }

    /// Remove an instance from culling without unloading it.
    pub fn hide_model_instance(&mut self, handle: ComponentHandle) -> bool {
        let Some(instance) = self.model_instance_mut(handle) else {
            return false;
        };
        instance.visible = false;
        self.spatial_index.remove_static(handle);
        self.light_influence.remove_everywhere(handle);
        true
    }

    // ===== ASSET NOTIFICATIONS =====

    /// Populate every instance bound to a model that became ready.
    pub fn on_asset_ready(&mut self, model: &Arc<Model>) {
        prism_debug!(SOURCE, "Model '{}' ready", model.path());
        for handle in self.instances_of(model) {
            self.model_instance_loaded(handle);
        }
    }

    /// Tear down every instance bound to a model that lost its data.
    pub fn on_asset_unloaded(&mut self, model: &Arc<Model>) {
        prism_debug!(SOURCE, "Model '{}' unloaded", model.path());
        for handle in self.instances_of(model) {
            self.model_instance_unloaded(handle);
        }
    }

    /// Number of model instances sharing the subscription to a model.
    pub fn model_subscription_count(&self, model: &Model) -> u32 {
        self.subscriptions.ref_count(model.key())
    }

    /// Number of distinct models subscribed to.
    pub fn subscribed_model_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn instances_of(&self, model: &Arc<Model>) -> Vec<ComponentHandle> {
        self.model_instances()
            .filter(|(_, instance)| instance.model.as_ref().is_some_and(|m| m.key() == model.key()))
            .map(|(handle, _)| handle)
            .collect()
    }

    fn model_instance_loaded(&mut self, handle: ComponentHandle) {
        let assets = self.assets.clone();
        let universe = self.universe.clone();
        let mut assets = lock_assets(&assets);

        let Some(instance) = self.model_instances.get_mut(handle.index()).and_then(Option::as_mut) else {
            return;
        };
        let Some(data) = instance.model.as_ref().and_then(|model| model.data()) else {
            return;
        };

        let first_layers = data.meshes().first().and_then(Mesh::material).map_or(0, |m| m.layer_count());
        instance.kind = if first_layers > 0 {
            ModelInstanceKind::Multilayer
        } else if data.bone_count() > 0 {
            ModelInstanceKind::Skinned
        } else {
            ModelInstanceKind::Rigid
        };

        instance.matrix = universe.matrix(instance.entity);
        instance.pose = (data.bone_count() > 0).then(|| Pose::from_bones(data.bones()));

        if instance.meshes.is_owned() {
            allocate_custom_meshes(&mut instance.meshes, data.mesh_count(), &mut *assets);
            if let SubmeshList::Owned(list) = &mut instance.meshes {
                for (slot, source) in list.iter_mut().zip(data.meshes().iter()) {
                    slot.set_name(source.name());
                    if slot.material().is_none() {
                        if let Some(material) = source.material() {
                            assets.add_material_ref(material);
                            slot.set_material(Some(material.clone()));
                        }
                    }
                }
            }
        } else {
            instance.meshes = SubmeshList::Shared(data.meshes().clone());
        }

        instance.data = Some(data);
        let visible = instance.visible;
        drop(assets);

        if visible {
            self.add_spatial_entry(handle);
        }
        self.retest_light_influence(handle);
    }

    fn model_instance_unloaded(&mut self, handle: ComponentHandle) {
        let Some(instance) = self.model_instance_mut(handle) else {
            return;
        };
        if !instance.meshes.is_owned() {
            instance.meshes = SubmeshList::Empty;
        }
        instance.pose = None;
        instance.data = None;
        instance.kind = ModelInstanceKind::Rigid;

        self.light_influence.remove_everywhere(handle);
        self.spatial_index.remove_static(handle);
    }

    // ===== SPATIAL ENTRY =====

    /// World sphere of a ready instance: entity position, bounding radius × scale.
    pub(super) fn model_instance_sphere(&self, handle: ComponentHandle) -> Option<Sphere> {
        let instance = self.model_instance(handle)?;
        let data = instance.data.as_ref()?;
        let scale = self.universe.scale(instance.entity);
        Some(Sphere::new(
            self.universe.position(instance.entity),
            data.bounding_radius() * scale,
        ))
    }

    fn add_spatial_entry(&mut self, handle: ComponentHandle) {
        let Some(sphere) = self.model_instance_sphere(handle) else {
            return;
        };
        let layer_mask = self.model_instance(handle).map_or(LayerMask::DEFAULT, |i| i.meshes.layer_mask());
        self.spatial_index.add_static(handle, sphere, layer_mask);
    }

    /// Refresh the cached matrix and push the new sphere.
    pub(super) fn update_model_instance_transform(&mut self, handle: ComponentHandle) {
        let universe = self.universe.clone();
        let Some(instance) = self.model_instance_mut(handle) else {
            return;
        };
        instance.matrix = universe.matrix(instance.entity);

        if let Some(sphere) = self.model_instance_sphere(handle) {
            self.spatial_index.update_sphere(handle, sphere);
        }
    }
}

#[cfg(test)]
#[path = "model_instance_tests.rs"]
mod tests;
