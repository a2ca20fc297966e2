/// Camera: component data for a view attached to an entity.
///
/// The camera stores projection parameters only. Its position and
/// orientation come from the owning entity's transform; `frustum()`
/// combines both on demand.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use crate::universe::Entity;
use super::frustum::Frustum;

/// Longest slot name a camera keeps (longer names are truncated)
pub const MAX_SLOT_LENGTH: usize = 30;

/// Camera component. Cameras are looked up by slot ("main", "editor", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub entity: Entity,
    slot: String,
    /// Vertical field of view in radians
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub is_ortho: bool,
    /// Half height of the orthographic view volume
    pub ortho_size: f32,
    pub screen_width: f32,
    pub screen_height: f32,
}

impl Camera {
    /// Camera with 60° fov, near 0.1, far 10000, ortho size 10 and an 800x600 screen.
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            slot: String::new(),
            fov: 60.0_f32.to_radians(),
            near: 0.1,
            far: 10000.0,
            is_ortho: false,
            ortho_size: 10.0,
            screen_width: 800.0,
            screen_height: 600.0,
        }
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Set the slot name, truncated to MAX_SLOT_LENGTH characters.
    pub fn set_slot(&mut self, slot: &str) {
        self.slot = slot.chars().take(MAX_SLOT_LENGTH).collect();
    }

    pub fn set_screen_size(&mut self, width: f32, height: f32) {
        self.screen_width = width;
        self.screen_height = height;
    }

    /// Width over height, 1 for a degenerate screen.
    pub fn aspect_ratio(&self) -> f32 {
        if self.screen_height > 0.0 {
            self.screen_width / self.screen_height
        } else {
            1.0
        }
    }

    /// View frustum for a camera placed at `position` with `rotation`.
    ///
    /// Perspective frusta carry `fov`; orthographic ones carry 0.
    pub fn frustum(&self, position: Vec3, rotation: Quat) -> Frustum {
        if self.is_ortho {
            let half_height = self.ortho_size;
            let half_width = half_height * self.aspect_ratio();
            Frustum::orthographic(position, rotation, half_width, half_height, self.near, self.far)
        } else {
            Frustum::perspective(position, rotation, self.fov, self.aspect_ratio(), self.near, self.far)
        }
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
