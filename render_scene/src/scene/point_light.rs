/// Point lights.
///
/// Lights live in a dense array that is swap-removed on destruction, so a
/// light's storage slot changes over time. Callers only ever see the
/// light's handle, allocated from a monotonically increasing counter and
/// mapped to the current slot.

use glam::Vec3;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use crate::camera::Frustum;
use crate::culling::Sphere;
use crate::universe::{ComponentHandle, Entity};
use crate::{prism_debug, prism_warn};
use super::render_scene::{RenderScene, SOURCE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    entity: Entity,
    /// Fixed at creation; the store maps it to the current slot
    handle: ComponentHandle,
    pub diffuse_color: Vec3,
    pub diffuse_intensity: f32,
    pub specular_color: Vec3,
    pub specular_intensity: f32,
    /// Cutoff angle in radians
    pub fov: f32,
    pub attenuation: f32,
    /// Effect radius; changed through `RenderScene::set_point_light_range`
    range: f32,
    pub cast_shadows: bool,
}

impl PointLight {
    pub fn new(entity: Entity, handle: ComponentHandle) -> Self {
        Self {
            entity,
            handle,
            diffuse_color: Vec3::ONE,
            diffuse_intensity: 1.0,
            specular_color: Vec3::ONE,
            specular_intensity: 1.0,
            fov: 360.0_f32.to_radians(),
            attenuation: 2.0,
            range: 10.0,
            cast_shadows: false,
        }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn handle(&self) -> ComponentHandle {
        self.handle
    }

    pub fn range(&self) -> f32 {
        self.range
    }
}

// ============================================================================
// STORE
// ============================================================================

/// Dense light array with handle → slot and entity → handle maps.
#[derive(Debug, Default)]
pub(crate) struct PointLightStore {
    lights: Vec<PointLight>,
    slots: FxHashMap<ComponentHandle, usize>,
    by_entity: FxHashMap<Entity, ComponentHandle>,
    next_handle: u32,
}

impl PointLightStore {
    /// Append a new light with default parameters.
    pub(crate) fn create(&mut self, entity: Entity) -> ComponentHandle {
        let handle = ComponentHandle(self.next_handle);
        self.next_handle += 1;
        self.insert(PointLight::new(entity, handle));
        handle
    }

    /// Append a light keeping its handle, returning its slot.
    pub(crate) fn insert(&mut self, light: PointLight) -> usize {
        let slot = self.lights.len();
        self.next_handle = self.next_handle.max(light.handle.0 + 1);
        self.slots.insert(light.handle, slot);
        self.by_entity.insert(light.entity, light.handle);
        self.lights.push(light);
        slot
    }

    /// Swap-remove a light. Returns the slot it occupied and the light.
    pub(crate) fn remove(&mut self, handle: ComponentHandle) -> Option<(usize, PointLight)> {
        let slot = self.slots.remove(&handle)?;
        let light = self.lights.swap_remove(slot);
        self.by_entity.remove(&light.entity);
        if let Some(moved) = self.lights.get(slot) {
            self.slots.insert(moved.handle, slot);
        }
        Some((slot, light))
    }

    pub(crate) fn slot(&self, handle: ComponentHandle) -> Option<usize> {
        self.slots.get(&handle).copied()
    }

    pub(crate) fn get(&self, handle: ComponentHandle) -> Option<&PointLight> {
        self.lights.get(self.slot(handle)?)
    }

    pub(crate) fn get_mut(&mut self, handle: ComponentHandle) -> Option<&mut PointLight> {
        let slot = self.slot(handle)?;
        self.lights.get_mut(slot)
    }

    pub(crate) fn at(&self, slot: usize) -> Option<&PointLight> {
        self.lights.get(slot)
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'_, PointLight> {
        self.lights.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.lights.len()
    }

    pub(crate) fn handle_of(&self, entity: Entity) -> Option<ComponentHandle> {
        self.by_entity.get(&entity).copied()
    }

    pub(crate) fn next_handle(&self) -> u32 {
        self.next_handle
    }

    pub(crate) fn set_next_handle(&mut self, next_handle: u32) {
        self.next_handle = self.next_handle.max(next_handle);
    }
}

// ============================================================================
// SCENE API
// ============================================================================

impl RenderScene {
    /// Create a point light and detect the geometry it influences.
    pub fn create_point_light(&mut self, entity: Entity) -> ComponentHandle {
        if let Some(handle) = self.point_lights.handle_of(entity) {
            prism_warn!(SOURCE, "Entity {} already has a point light", entity.0);
            return handle;
        }

        let handle = self.point_lights.create(entity);
        self.light_influence.push_light();
        debug_assert_eq!(self.light_influence.len(), self.point_lights.len());

        self.detect_light_influenced_geometry(handle);

        prism_debug!(SOURCE, "Point light {} created on entity {}", handle.0, entity.0);
        handle
    }

    /// Re-insert a persisted light keeping its handle.
    pub(super) fn insert_point_light(&mut self, light: PointLight) -> ComponentHandle {
        let handle = light.handle;
        if let Some(existing) = self.point_lights.handle_of(light.entity) {
            self.destroy_point_light(existing);
        }
        self.point_lights.insert(light);
        self.light_influence.push_light();
        self.detect_light_influenced_geometry(handle);
        handle
    }

    /// Destroy a point light and drop its influence list.
    pub fn destroy_point_light(&mut self, handle: ComponentHandle) -> bool {
        let Some((slot, light)) = self.point_lights.remove(handle) else {
            prism_warn!(SOURCE, "Destroying unknown point light {}", handle.0);
            return false;
        };
        self.light_influence.swap_remove(slot);

        prism_debug!(SOURCE, "Point light {} destroyed (entity {})", handle.0, light.entity.0);
        true
    }

    pub fn point_light(&self, handle: ComponentHandle) -> Option<&PointLight> {
        self.point_lights.get(handle)
    }

    /// Mutable access to the light parameters. Entity, handle and range
    /// stay read-only.
    pub fn point_light_mut(&mut self, handle: ComponentHandle) -> Option<&mut PointLight> {
        self.point_lights.get_mut(handle)
    }

    pub fn point_light_component(&self, entity: Entity) -> Option<ComponentHandle> {
        self.point_lights.handle_of(entity)
    }

    pub fn point_light_count(&self) -> usize {
        self.point_lights.len()
    }

    /// Iterate over lights in storage order.
    pub fn point_lights(&self) -> impl Iterator<Item = &PointLight> + '_ {
        self.point_lights.iter()
    }

    /// Change a light's range and rebuild its influence list.
    pub fn set_point_light_range(&mut self, handle: ComponentHandle, range: f32) -> bool {
        let Some(light) = self.point_lights.get_mut(handle) else {
            return false;
        };
        light.range = range;
        self.detect_light_influenced_geometry(handle);
        true
    }

    /// Effect sphere of a light: entity position, range.
    pub fn point_light_sphere(&self, handle: ComponentHandle) -> Option<Sphere> {
        let light = self.point_lights.get(handle)?;
        Some(Sphere::new(self.universe.position(light.entity), light.range))
    }

    /// Axis-aligned box frustum of half-size `range` centred on the light.
    pub fn light_frustum(&self, handle: ComponentHandle) -> Option<Frustum> {
        let sphere = self.point_light_sphere(handle)?;
        Some(Frustum::from_box(sphere.center, sphere.radius))
    }

    /// Lights whose effect sphere intersects the frustum.
    pub fn point_lights_in_frustum(&self, frustum: &Frustum) -> Vec<ComponentHandle> {
        self.point_lights
            .iter()
            .filter(|light| {
                let sphere = Sphere::new(self.universe.position(light.entity), light.range);
                frustum.intersects_sphere(&sphere)
            })
            .map(|light| light.handle)
            .collect()
    }

    /// Up to `max` lights closest to `point`, nearest first.
    ///
    /// `max` is clamped to the configured `max_closest_lights`.
    pub fn closest_point_lights(&self, point: Vec3, max: usize) -> Vec<ComponentHandle> {
        let max = max.min(self.config.max_closest_lights);
        if max == 0 {
            return Vec::new();
        }

        let mut closest: Vec<(f32, ComponentHandle)> = Vec::with_capacity(max + 1);
        for light in self.point_lights.iter() {
            let distance = point.distance_squared(self.universe.position(light.entity));
            if closest.len() == max && closest.last().is_some_and(|&(d, _)| d <= distance) {
                continue;
            }
            let at = closest.partition_point(|&(d, _)| d <= distance);
            closest.insert(at, (distance, light.handle));
            closest.truncate(max);
        }

        closest.into_iter().map(|(_, handle)| handle).collect()
    }
}

#[cfg(test)]
#[path = "point_light_tests.rs"]
mod tests;
