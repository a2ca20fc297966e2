/// Camera store.
///
/// Cameras are keyed by entity and found by slot name. The first camera
/// created while no camera holds the "main" slot takes it.

use crate::camera::{Camera, Frustum};
use crate::universe::{ComponentHandle, Entity};
use crate::{prism_debug, prism_warn};
use super::render_scene::{RenderScene, SOURCE};

/// Slot given to the first camera
pub const MAIN_CAMERA_SLOT: &str = "main";

impl RenderScene {
    pub fn create_camera(&mut self, entity: Entity) -> ComponentHandle {
        let handle = ComponentHandle::from_entity(entity);
        if self.cameras.contains_key(&entity) {
            prism_warn!(SOURCE, "Entity {} already has a camera", entity.0);
            return handle;
        }

        let mut camera = Camera::new(entity);
        if self.camera_in_slot(MAIN_CAMERA_SLOT).is_none() {
            camera.set_slot(MAIN_CAMERA_SLOT);
        }
        self.cameras.insert(entity, camera);

        prism_debug!(SOURCE, "Camera created on entity {}", entity.0);
        handle
    }

    pub fn destroy_camera(&mut self, handle: ComponentHandle) -> bool {
        if self.cameras.remove(&handle.entity()).is_none() {
            prism_warn!(SOURCE, "Destroying unknown camera {}", handle.0);
            return false;
        }
        true
    }

    pub fn camera(&self, handle: ComponentHandle) -> Option<&Camera> {
        self.cameras.get(&handle.entity())
    }

    pub fn camera_mut(&mut self, handle: ComponentHandle) -> Option<&mut Camera> {
        self.cameras.get_mut(&handle.entity())
    }

    /// Camera holding `slot`. Ties go to the lowest entity.
    pub fn camera_in_slot(&self, slot: &str) -> Option<ComponentHandle> {
        self.cameras
            .values()
            .filter(|camera| camera.slot() == slot)
            .map(|camera| camera.entity)
            .min()
            .map(ComponentHandle::from_entity)
    }

    /// View frustum of a camera at its entity's current transform.
    pub fn camera_frustum(&self, handle: ComponentHandle) -> Option<Frustum> {
        let camera = self.camera(handle)?;
        let transform = self.universe.transform(camera.entity).unwrap_or_default();
        Some(camera.frustum(transform.position, transform.rotation))
    }
}

#[cfg(test)]
#[path = "cameras_tests.rs"]
mod tests;
