/// Visibility and LOD queries.
///
/// A query culls the spatial index against a frustum, then resolves the
/// LOD of every visible model instance in parallel, one job per culling
/// batch. Jobs only read the scene and each writes its own output list;
/// the collect at the end of the parallel map is the join point.

use glam::Vec3;
use rayon::prelude::*;
use crate::camera::Frustum;
use crate::culling::LayerMask;
use crate::universe::{ComponentHandle, Entity};
use super::model_instance::ModelInstance;
use super::render_scene::RenderScene;

/// Draw candidate: one submesh of one model instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelInstanceMesh {
    pub model_instance: ComponentHandle,
    pub mesh_index: usize,
}

impl RenderScene {
    /// Draw candidates for a frustum, grouped by culling batch.
    ///
    /// # Arguments
    ///
    /// * `frustum` - View frustum; its fov scales LOD distances when perspective
    /// * `lod_reference` - Point LOD distances are measured from (usually the camera)
    /// * `layer_mask` - Only model instances on matching layers are returned
    pub fn model_instance_infos(
        &self,
        frustum: &Frustum,
        lod_reference: Vec3,
        layer_mask: LayerMask,
    ) -> Vec<Vec<ModelInstanceMesh>> {
        if self.model_instance_count == 0 {
            return Vec::new();
        }

        let spatial_index = self.spatial_index.as_ref();
        let batches = self.pool.install(|| spatial_index.cull_to_frustum(frustum, layer_mask));

        let lod_multiplier = self.effective_lod_multiplier(frustum);
        let instances = self.model_instances.as_slice();

        self.pool.install(|| {
            batches
                .par_iter()
                .map(|batch| {
                    let mut infos = Vec::new();
                    for &handle in batch {
                        let Some(instance) = instances.get(handle.index()).and_then(Option::as_ref) else {
                            continue;
                        };
                        push_lod_meshes(&mut infos, handle, instance, lod_reference, lod_multiplier);
                    }
                    infos
                })
                .collect()
        })
    }

    /// Entities of every model instance in the frustum, any layer.
    pub fn model_instance_entities(&self, frustum: &Frustum) -> Vec<Entity> {
        let spatial_index = self.spatial_index.as_ref();
        let batches = self.pool.install(|| spatial_index.cull_to_frustum(frustum, LayerMask::all()));
        batches
            .into_iter()
            .flatten()
            .filter_map(|handle| self.model_instance(handle).map(ModelInstance::entity))
            .collect()
    }

    /// Global LOD multiplier, scaled by `(fov / reference fov)²` for perspective frusta.
    pub fn effective_lod_multiplier(&self, frustum: &Frustum) -> f32 {
        let mut multiplier = self.config.lod_multiplier;
        if frustum.is_perspective() && self.config.lod_reference_fov > 0.0 {
            let t = frustum.fov / self.config.lod_reference_fov;
            multiplier *= t * t;
        }
        multiplier
    }
}

fn push_lod_meshes(
    infos: &mut Vec<ModelInstanceMesh>,
    handle: ComponentHandle,
    instance: &ModelInstance,
    lod_reference: Vec3,
    lod_multiplier: f32,
) {
    let Some(data) = instance.data() else {
        return;
    };
    let mesh_count = instance.meshes().len();
    if mesh_count == 0 {
        return;
    }

    let squared_distance = instance.position().distance_squared(lod_reference) * lod_multiplier;
    let Some(lod) = data.lod_mesh_indices(squared_distance) else {
        return;
    };

    let to = lod.to.min(mesh_count - 1);
    infos.extend((lod.from..=to).map(|mesh_index| ModelInstanceMesh { model_instance: handle, mesh_index }));
}

#[cfg(test)]
#[path = "visibility_tests.rs"]
mod tests;
