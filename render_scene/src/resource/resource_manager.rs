/// Central resource manager: reference-counted models and materials.
///
/// Models are stored in a SlotMap for stable keys. Their contents are
/// pushed in by the loader through `finish_model_load` and withdrawn by
/// `release_model`; both queue an `AssetEvent` when the model is subscribed.
///
/// Materials are known by path. `define_material` registers a material's
/// description; a material is ready once its path has been defined.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use crate::error::Result;
use crate::{prism_bail, prism_debug, prism_warn};
use super::asset_manager::{AssetEvent, AssetManager};
use super::material::{Material, MaterialDesc};
use super::model::{Model, ModelData, ModelDesc, ModelKey};

const SOURCE: &str = "prism::ResourceManager";

struct ModelEntry {
    model: Arc<Model>,
    ref_count: u32,
    subscribed: bool,
}

struct MaterialEntry {
    material: Arc<Material>,
    ref_count: u32,
}

/// Reference asset manager used by tools and tests.
#[derive(Default)]
pub struct ResourceManager {
    models: SlotMap<ModelKey, ModelEntry>,
    model_paths: FxHashMap<String, ModelKey>,
    materials: FxHashMap<String, MaterialEntry>,
    /// Known material descriptions by path
    material_descs: FxHashMap<String, MaterialDesc>,
    events: Vec<AssetEvent>,
}

impl ResourceManager {
    /// Create a new empty resource manager
    pub fn new() -> Self {
        Self::default()
    }

    // ===== LOADER SIDE =====

    /// Register a material description. Loaded materials with this path
    /// become ready immediately.
    pub fn define_material(&mut self, path: &str, desc: MaterialDesc) {
        self.material_descs.insert(path.to_string(), desc);
        if let Some(entry) = self.materials.get(path) {
            entry.material.set_desc(Some(desc));
        }
    }

    /// Deliver a model's contents. The model must have been requested with
    /// `load_model`. Reloading a ready model replaces its data.
    ///
    /// Each mesh takes one reference on its material.
    pub fn finish_model_load(&mut self, path: &str, desc: ModelDesc) -> Result<()> {
        let Some(&key) = self.model_paths.get(path) else {
            prism_bail!(SOURCE, "Model '{}' was never requested", path);
        };

        let materials: Vec<Arc<Material>> =
            desc.meshes.iter().map(|mesh| self.load_material(&mesh.material)).collect();

        let data = match ModelData::from_desc(desc, materials.clone()) {
            Ok(data) => data,
            Err(err) => {
                for material in &materials {
                    self.unload_material(material);
                }
                return Err(err);
            }
        };

        let model = self.models[key].model.clone();
        if let Some(previous) = model.set_data(Some(Arc::new(data))) {
            self.release_mesh_materials(&previous);
        }

        prism_debug!(SOURCE, "Model '{}' ready", path);
        self.push_event(key, AssetEvent::Ready(model));
        Ok(())
    }

    /// Withdraw a model's contents (unload or hot reload). Returns false if
    /// the model is unknown or not ready.
    pub fn release_model(&mut self, path: &str) -> bool {
        let Some(&key) = self.model_paths.get(path) else {
            return false;
        };

        let model = self.models[key].model.clone();
        let Some(previous) = model.set_data(None) else {
            return false;
        };
        self.release_mesh_materials(&previous);

        prism_debug!(SOURCE, "Model '{}' unloaded", path);
        self.push_event(key, AssetEvent::Unloaded(model));
        true
    }

    // ===== QUERIES =====

    /// Live references to a model (0 if unknown)
    pub fn model_ref_count(&self, path: &str) -> u32 {
        self.model_paths.get(path).map_or(0, |&key| self.models[key].ref_count)
    }

    /// Live references to a material (0 if unknown)
    pub fn material_ref_count(&self, path: &str) -> u32 {
        self.materials.get(path).map_or(0, |e| e.ref_count)
    }

    /// Whether events are delivered for this model
    pub fn is_subscribed(&self, path: &str) -> bool {
        self.model_paths.get(path).is_some_and(|&key| self.models[key].subscribed)
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    // ===== INTERNAL =====

    fn release_mesh_materials(&mut self, data: &ModelData) {
        for mesh in data.meshes().iter() {
            if let Some(material) = mesh.material() {
                self.unload_material(material);
            }
        }
    }

    fn push_event(&mut self, key: ModelKey, event: AssetEvent) {
        if self.models.get(key).is_some_and(|e| e.subscribed) {
            self.events.push(event);
        }
    }
}

impl AssetManager for ResourceManager {
    fn load_model(&mut self, path: &str) -> Arc<Model> {
        if let Some(&key) = self.model_paths.get(path) {
            let entry = &mut self.models[key];
            entry.ref_count += 1;
            return entry.model.clone();
        }

        let key = self.models.insert_with_key(|key| ModelEntry {
            model: Arc::new(Model::new(key, path)),
            ref_count: 1,
            subscribed: false,
        });
        self.model_paths.insert(path.to_string(), key);
        self.models[key].model.clone()
    }

    fn unload_model(&mut self, model: &Arc<Model>) {
        let Some(entry) = self.models.get_mut(model.key()) else {
            prism_warn!(SOURCE, "Unloading unknown model '{}'", model.path());
            return;
        };

        entry.ref_count -= 1;
        if entry.ref_count > 0 {
            return;
        }

        if let Some(entry) = self.models.remove(model.key()) {
            self.model_paths.remove(entry.model.path());
            if let Some(previous) = entry.model.set_data(None) {
                self.release_mesh_materials(&previous);
            }
        }
    }

    fn load_material(&mut self, path: &str) -> Arc<Material> {
        if let Some(entry) = self.materials.get_mut(path) {
            entry.ref_count += 1;
            return entry.material.clone();
        }

        let desc = self.material_descs.get(path).copied();
        let material = Arc::new(Material::new(path, desc));
        self.materials.insert(
            path.to_string(),
            MaterialEntry { material: material.clone(), ref_count: 1 },
        );
        material
    }

    fn add_material_ref(&mut self, material: &Arc<Material>) {
        match self.materials.get_mut(material.path()) {
            Some(entry) => entry.ref_count += 1,
            None => {
                // Re-register a material whose last reference was dropped
                self.materials.insert(
                    material.path().to_string(),
                    MaterialEntry { material: material.clone(), ref_count: 1 },
                );
            }
        }
    }

    fn unload_material(&mut self, material: &Arc<Material>) {
        let Some(entry) = self.materials.get_mut(material.path()) else {
            prism_warn!(SOURCE, "Unloading unknown material '{}'", material.path());
            return;
        };

        entry.ref_count -= 1;
        if entry.ref_count == 0 {
            self.materials.remove(material.path());
        }
    }

    fn subscribe(&mut self, model: &Arc<Model>) {
        if let Some(entry) = self.models.get_mut(model.key()) {
            entry.subscribed = true;
        }
    }

    fn unsubscribe(&mut self, model: &Arc<Model>) {
        if let Some(entry) = self.models.get_mut(model.key()) {
            entry.subscribed = false;
        }
    }

    fn drain_events(&mut self) -> Vec<AssetEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
#[path = "resource_manager_tests.rs"]
mod tests;
