/// Light influence cache.
///
/// One list of model instance handles per point light slot, holding the
/// instances whose spatial sphere intersects the light's effect sphere.
/// Lists are kept parallel to the point light array: created, swap-removed
/// and rebuilt alongside it.
///
/// Invalidation:
/// - light created, moved or resized: that light's list is rebuilt
/// - model instance moved or loaded: the handle is re-tested against every light
/// - model instance hidden, unloaded or destroyed: the handle is removed everywhere

use crate::camera::Frustum;
use crate::culling::{LayerMask, Sphere};
use crate::universe::ComponentHandle;
use crate::prism_trace;
use super::render_scene::RenderScene;
use super::visibility::ModelInstanceMesh;

const SOURCE: &str = "prism::LightInfluence";

#[derive(Debug, Default)]
pub(crate) struct LightInfluenceCache {
    lists: Vec<Vec<ComponentHandle>>,
}

impl LightInfluenceCache {
    pub(crate) fn push_light(&mut self) {
        self.lists.push(Vec::new());
    }

    /// Mirror of the point light array's swap-remove.
    pub(crate) fn swap_remove(&mut self, slot: usize) {
        if slot < self.lists.len() {
            self.lists.swap_remove(slot);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lists.len()
    }

    pub(crate) fn list(&self, slot: usize) -> &[ComponentHandle] {
        self.lists.get(slot).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn set(&mut self, slot: usize, list: Vec<ComponentHandle>) {
        if let Some(entry) = self.lists.get_mut(slot) {
            *entry = list;
        }
    }

    pub(crate) fn insert_unique(&mut self, slot: usize, handle: ComponentHandle) {
        if let Some(list) = self.lists.get_mut(slot) {
            if !list.contains(&handle) {
                list.push(handle);
            }
        }
    }

    pub(crate) fn remove_everywhere(&mut self, handle: ComponentHandle) {
        for list in &mut self.lists {
            list.retain(|&h| h != handle);
        }
    }
}

impl RenderScene {
    /// Rebuild one light's list from a spatial query of its effect volume.
    ///
    /// The query box is tested first, then every candidate is re-tested
    /// sphere against sphere.
    pub(super) fn detect_light_influenced_geometry(&mut self, light: ComponentHandle) {
        let (Some(slot), Some(light_sphere)) = (self.point_lights.slot(light), self.point_light_sphere(light)) else {
            return;
        };

        let frustum = Frustum::from_box(light_sphere.center, light_sphere.radius);
        let spatial_index = self.spatial_index.as_ref();
        let batches = self.pool.install(|| spatial_index.cull_to_frustum(&frustum, LayerMask::all()));

        let influenced: Vec<ComponentHandle> = batches
            .into_iter()
            .flatten()
            .filter(|&handle| {
                spatial_index.sphere(handle).is_some_and(|sphere| sphere.intersects(&light_sphere))
            })
            .collect();

        prism_trace!(SOURCE, "Light {} influences {} model instances", light.0, influenced.len());
        self.light_influence.set(slot, influenced);
    }

    /// Re-test one model instance against every light.
    pub(super) fn retest_light_influence(&mut self, handle: ComponentHandle) {
        self.light_influence.remove_everywhere(handle);

        let Some(sphere) = self.spatial_index.sphere(handle) else {
            return;
        };

        for slot in 0..self.point_lights.len() {
            let Some(light) = self.point_lights.at(slot) else {
                continue;
            };
            let light_sphere = Sphere::new(self.universe.position(light.entity()), light.range());
            if sphere.intersects(&light_sphere) {
                self.light_influence.insert_unique(slot, handle);
            }
        }
    }

    /// Rebuild every light's list.
    pub fn rebuild_light_influence(&mut self) {
        let lights: Vec<ComponentHandle> = self.point_lights.iter().map(|light| light.handle()).collect();
        for light in lights {
            self.detect_light_influenced_geometry(light);
        }
    }

    /// Model instances currently in the light's list (empty for unknown lights).
    pub fn influenced_geometry(&self, light: ComponentHandle) -> &[ComponentHandle] {
        match self.point_lights.slot(light) {
            Some(slot) => self.light_influence.list(slot),
            None => &[],
        }
    }

    /// One entry per submesh of every influenced model instance.
    pub fn influenced_geometry_meshes(&self, light: ComponentHandle) -> Vec<ModelInstanceMesh> {
        self.influenced_geometry(light)
            .iter()
            .flat_map(|&handle| self.model_instance_meshes(handle))
            .collect()
    }

    /// Like `influenced_geometry_meshes`, restricted to model instances
    /// whose sphere intersects the frustum at read time.
    pub fn influenced_geometry_in_frustum(&self, light: ComponentHandle, frustum: &Frustum) -> Vec<ModelInstanceMesh> {
        self.influenced_geometry(light)
            .iter()
            .filter(|&&handle| {
                self.spatial_index.sphere(handle).is_some_and(|sphere| frustum.intersects_sphere(&sphere))
            })
            .flat_map(|&handle| self.model_instance_meshes(handle))
            .collect()
    }

    fn model_instance_meshes(&self, handle: ComponentHandle) -> impl Iterator<Item = ModelInstanceMesh> {
        let count = self.model_instance_material_count(handle);
        (0..count).map(move |mesh_index| ModelInstanceMesh { model_instance: handle, mesh_index })
    }
}

#[cfg(test)]
#[path = "light_influence_tests.rs"]
mod tests;
