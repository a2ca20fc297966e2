/// Bounding volumes used by the spatial indices.
///
/// Renderables are summarized by a world-space `Sphere`. The octree works
/// with axis-aligned boxes, so spheres are converted with `AABB::from_sphere`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// World-space bounding sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Strict overlap test: touching spheres do not intersect.
    pub fn intersects(&self, other: &Sphere) -> bool {
        let reach = self.radius + other.radius;
        self.center.distance_squared(other.center) < reach * reach
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl AABB {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Tightest box around a sphere.
    pub fn from_sphere(sphere: &Sphere) -> Self {
        let extent = Vec3::splat(sphere.radius.abs());
        Self {
            min: sphere.center - extent,
            max: sphere.center + extent,
        }
    }

    /// Center point of this box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Test if this box fully contains another box.
    ///
    /// Used by the octree to decide if an object fits entirely within a child node.
    pub fn contains(&self, other: &AABB) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x
        && self.min.y <= other.min.y && self.max.y >= other.max.y
        && self.min.z <= other.min.z && self.max.z >= other.max.z
    }

    /// Test if this box overlaps another box (touching counts).
    pub fn intersects(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
        && self.min.y <= other.max.y && self.max.y >= other.min.y
        && self.min.z <= other.max.z && self.max.z >= other.min.z
    }
}

#[cfg(test)]
#[path = "bounds_tests.rs"]
mod tests;
