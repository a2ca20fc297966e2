/// Decals.
///
/// A decal projects a material inside an oriented box. The box's world
/// matrix, its inverse and a bounding sphere are cached from the entity
/// transform and refreshed when the entity moves or the scale changes.

use std::sync::Arc;
use glam::{Mat4, Vec3};
use crate::camera::Frustum;
use crate::culling::Sphere;
use crate::resource::Material;
use crate::universe::{ComponentHandle, Entity};
use crate::{prism_debug, prism_warn};
use super::render_scene::{lock_assets, RenderScene, SOURCE};

#[derive(Debug, Clone)]
pub struct Decal {
    pub(super) entity: Entity,
    pub(super) material: Option<Arc<Material>>,
    pub(super) scale: Vec3,
    pub(super) position: Vec3,
    pub(super) radius: f32,
    pub(super) matrix: Mat4,
    pub(super) inv_matrix: Mat4,
}

impl Decal {
    fn new(entity: Entity) -> Self {
        Self {
            entity,
            material: None,
            scale: Vec3::ONE,
            position: Vec3::ZERO,
            radius: Vec3::ONE.length(),
            matrix: Mat4::IDENTITY,
            inv_matrix: Mat4::IDENTITY,
        }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn material(&self) -> Option<&Arc<Material>> {
        self.material.as_ref()
    }

    pub fn material_path(&self) -> &str {
        self.material.as_ref().map_or("", |material| material.path())
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Entity matrix with axes scaled by the decal scale
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    pub fn inv_matrix(&self) -> &Mat4 {
        &self.inv_matrix
    }
}

/// Decal drawn this frame
#[derive(Debug, Clone)]
pub struct DecalInfo {
    pub decal: ComponentHandle,
    pub material: Arc<Material>,
    pub position: Vec3,
    pub radius: f32,
    pub matrix: Mat4,
    pub inv_matrix: Mat4,
}

impl RenderScene {
    pub fn create_decal(&mut self, entity: Entity) -> ComponentHandle {
        let handle = ComponentHandle::from_entity(entity);
        if self.decals.contains_key(&entity) {
            prism_warn!(SOURCE, "Entity {} already has a decal", entity.0);
            return handle;
        }
        self.decals.insert(entity, Decal::new(entity));
        self.update_decal(entity);

        prism_debug!(SOURCE, "Decal created on entity {}", entity.0);
        handle
    }

    /// Destroy a decal and release its material.
    pub fn destroy_decal(&mut self, handle: ComponentHandle) -> bool {
        let Some(decal) = self.decals.remove(&handle.entity()) else {
            prism_warn!(SOURCE, "Destroying unknown decal {}", handle.0);
            return false;
        };
        if let Some(material) = &decal.material {
            lock_assets(&self.assets).unload_material(material);
        }
        true
    }

    pub fn decal(&self, handle: ComponentHandle) -> Option<&Decal> {
        self.decals.get(&handle.entity())
    }

    /// Load a material by path; an empty path unbinds it.
    pub fn set_decal_material_path(&mut self, handle: ComponentHandle, path: &str) -> bool {
        let Some(decal) = self.decals.get_mut(&handle.entity()) else {
            return false;
        };
        let mut assets = lock_assets(&self.assets);
        if let Some(previous) = decal.material.take() {
            assets.unload_material(&previous);
        }
        if !path.is_empty() {
            decal.material = Some(assets.load_material(path));
        }
        true
    }

    pub fn set_decal_scale(&mut self, handle: ComponentHandle, scale: Vec3) -> bool {
        let entity = handle.entity();
        let Some(decal) = self.decals.get_mut(&entity) else {
            return false;
        };
        decal.scale = scale;
        self.update_decal(entity);
        true
    }

    /// Refresh the cached position, radius and matrices.
    pub(super) fn update_decal(&mut self, entity: Entity) {
        let position = self.universe.position(entity);
        let entity_matrix = self.universe.matrix(entity);
        let Some(decal) = self.decals.get_mut(&entity) else {
            return;
        };

        let mut matrix = entity_matrix;
        matrix.x_axis *= decal.scale.x;
        matrix.y_axis *= decal.scale.y;
        matrix.z_axis *= decal.scale.z;

        decal.position = position;
        decal.radius = decal.scale.length();
        decal.matrix = matrix;
        decal.inv_matrix = matrix.inverse();
    }

    /// Decals with a ready material whose sphere intersects the frustum.
    pub fn decals_in_frustum(&self, frustum: &Frustum) -> Vec<DecalInfo> {
        let mut infos: Vec<DecalInfo> = self
            .decals
            .values()
            .filter(|decal| frustum.intersects_sphere(&Sphere::new(decal.position, decal.radius)))
            .filter_map(|decal| {
                let material = decal.material.as_ref().filter(|material| material.is_ready())?;
                Some(DecalInfo {
                    decal: ComponentHandle::from_entity(decal.entity),
                    material: material.clone(),
                    position: decal.position,
                    radius: decal.radius,
                    matrix: decal.matrix,
                    inv_matrix: decal.inv_matrix,
                })
            })
            .collect();
        infos.sort_by_key(|info| info.decal);
        infos
    }
}

#[cfg(test)]
#[path = "decal_tests.rs"]
mod tests;
