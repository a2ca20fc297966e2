/// Global (directional) lights.
///
/// Any number may exist, one is active. The first light created becomes
/// active; destroying the active light leaves none active.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use crate::universe::{ComponentHandle, Entity};
use crate::{prism_debug, prism_warn};
use super::render_scene::{RenderScene, SOURCE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalLight {
    pub entity: Entity,
    pub diffuse_color: Vec3,
    pub diffuse_intensity: f32,
    pub fog_color: Vec3,
    pub fog_density: f32,
    pub fog_bottom: f32,
    pub fog_height: f32,
    /// Shadow cascade split distances
    pub cascades: Vec4,
}

impl GlobalLight {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            diffuse_color: Vec3::ONE,
            diffuse_intensity: 0.0,
            fog_color: Vec3::ONE,
            fog_density: 0.0,
            fog_bottom: 0.0,
            fog_height: 10.0,
            cascades: Vec4::new(3.0, 8.0, 100.0, 300.0),
        }
    }
}

impl RenderScene {
    pub fn create_global_light(&mut self, entity: Entity) -> ComponentHandle {
        let handle = ComponentHandle::from_entity(entity);
        if self.global_lights.contains_key(&entity) {
            prism_warn!(SOURCE, "Entity {} already has a global light", entity.0);
            return handle;
        }

        if self.global_lights.is_empty() {
            self.active_global_light = Some(entity);
        }
        self.global_lights.insert(entity, GlobalLight::new(entity));

        prism_debug!(SOURCE, "Global light created on entity {}", entity.0);
        handle
    }

    pub(super) fn insert_global_light(&mut self, light: GlobalLight) {
        self.active_global_light = Some(light.entity);
        self.global_lights.insert(light.entity, light);
    }

    pub fn destroy_global_light(&mut self, handle: ComponentHandle) -> bool {
        let entity = handle.entity();
        if self.global_lights.remove(&entity).is_none() {
            prism_warn!(SOURCE, "Destroying unknown global light {}", handle.0);
            return false;
        }
        if self.active_global_light == Some(entity) {
            self.active_global_light = None;
        }
        true
    }

    pub fn global_light(&self, handle: ComponentHandle) -> Option<&GlobalLight> {
        self.global_lights.get(&handle.entity())
    }

    pub fn global_light_mut(&mut self, handle: ComponentHandle) -> Option<&mut GlobalLight> {
        self.global_lights.get_mut(&handle.entity())
    }

    pub fn global_light_count(&self) -> usize {
        self.global_lights.len()
    }

    pub fn active_global_light(&self) -> Option<ComponentHandle> {
        self.active_global_light.map(ComponentHandle::from_entity)
    }

    /// Make a light active. `None` or an unknown handle leaves no light active.
    pub fn set_active_global_light(&mut self, handle: Option<ComponentHandle>) {
        self.active_global_light = handle
            .map(ComponentHandle::entity)
            .filter(|entity| self.global_lights.contains_key(entity));
    }
}

#[cfg(test)]
#[path = "global_light_tests.rs"]
mod tests;
