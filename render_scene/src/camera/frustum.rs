/// Frustum: six clipping planes for visibility culling.
///
/// Each plane is represented as a Vec4 (A, B, C, D) where:
/// - (A, B, C) is the inward-pointing normal
/// - D is the signed distance
/// - A point P is inside the frustum if dot(plane, P_homogeneous) >= 0 for all planes
///
/// A frustum also carries the vertical field of view it was built with
/// (0 for orthographic and box frusta). The visibility pipeline scales its
/// LOD distances by it.

use glam::{Mat4, Quat, Vec3, Vec4};
use crate::culling::{Sphere, AABB};

/// Result of a 3-way frustum/AABB classification.
///
/// Used by OctreeSpatialIndex for hierarchical culling:
/// - `Outside` → skip the entire subtree
/// - `Inside` → collect all objects without further testing
/// - `Partial` → test individual objects and recurse into children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    /// AABB is entirely outside the frustum
    Outside,
    /// AABB is entirely inside the frustum
    Inside,
    /// AABB partially overlaps the frustum
    Partial,
}

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Six frustum planes for culling.
///
/// Normal (A, B, C) points inward (toward the visible volume).
/// Works with both perspective and orthographic projections.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// Frustum planes: left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
    /// Vertical field of view in radians, 0 when not a perspective frustum
    pub fov: f32,
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix.
    ///
    /// Uses the Gribb & Hartmann method. Works for both perspective
    /// and orthographic projections. The resulting `fov` is 0.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let m = vp.to_cols_array_2d();

        let mut planes = [
            // Left:   row3 + row0
            Vec4::new(m[0][3] + m[0][0], m[1][3] + m[1][0], m[2][3] + m[2][0], m[3][3] + m[3][0]),
            // Right:  row3 - row0
            Vec4::new(m[0][3] - m[0][0], m[1][3] - m[1][0], m[2][3] - m[2][0], m[3][3] - m[3][0]),
            // Bottom: row3 + row1
            Vec4::new(m[0][3] + m[0][1], m[1][3] + m[1][1], m[2][3] + m[2][1], m[3][3] + m[3][1]),
            // Top:    row3 - row1
            Vec4::new(m[0][3] - m[0][1], m[1][3] - m[1][1], m[2][3] - m[2][1], m[3][3] - m[3][1]),
            // Near:   row2 (zero-to-one depth range)
            Vec4::new(m[0][2], m[1][2], m[2][2], m[3][2]),
            // Far:    row3 - row2
            Vec4::new(m[0][3] - m[0][2], m[1][3] - m[1][2], m[2][3] - m[2][2], m[3][3] - m[3][2]),
        ];

        for plane in &mut planes {
            let normal_len = Vec3::new(plane.x, plane.y, plane.z).length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }

        Self { planes, fov: 0.0 }
    }

    /// Perspective frustum of a camera at `position` looking down its local -Z.
    pub fn perspective(
        position: Vec3,
        rotation: Quat,
        fov: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let view = Mat4::from_rotation_translation(rotation, position).inverse();
        let projection = Mat4::perspective_rh(fov, aspect, near, far);
        Self {
            fov,
            ..Self::from_view_projection(&(projection * view))
        }
    }

    /// Orthographic frustum of a camera at `position` looking down its local -Z.
    pub fn orthographic(
        position: Vec3,
        rotation: Quat,
        half_width: f32,
        half_height: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let view = Mat4::from_rotation_translation(rotation, position).inverse();
        let projection = Mat4::orthographic_rh(
            -half_width, half_width, -half_height, half_height, near, far,
        );
        Self::from_view_projection(&(projection * view))
    }

    /// Axis-aligned box frustum centred on `center` (point light volumes).
    pub fn from_box(center: Vec3, half_extent: f32) -> Self {
        let min = center - Vec3::splat(half_extent);
        let max = center + Vec3::splat(half_extent);
        Self {
            planes: [
                Vec4::new(1.0, 0.0, 0.0, -min.x),
                Vec4::new(-1.0, 0.0, 0.0, max.x),
                Vec4::new(0.0, 1.0, 0.0, -min.y),
                Vec4::new(0.0, -1.0, 0.0, max.y),
                Vec4::new(0.0, 0.0, 1.0, -min.z),
                Vec4::new(0.0, 0.0, -1.0, max.z),
            ],
            fov: 0.0,
        }
    }

    /// Whether this is a perspective frustum (LOD distances scale with fov).
    pub fn is_perspective(&self) -> bool {
        self.fov > 0.0
    }

    /// Test if a sphere intersects this frustum.
    ///
    /// Conservative near the frustum corners: may return false positives,
    /// never false negatives.
    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        self.planes.iter().all(|plane| {
            let normal = Vec3::new(plane.x, plane.y, plane.z);
            normal.dot(sphere.center) + plane.w >= -sphere.radius
        })
    }

    /// Test if an AABB intersects this frustum.
    ///
    /// Uses the "positive vertex" test: for each plane, find the AABB corner
    /// most in the direction of the plane normal. If that corner is outside,
    /// the AABB is fully outside.
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        self.planes.iter().all(|plane| {
            let normal = Vec3::new(plane.x, plane.y, plane.z);
            normal.dot(Self::positive_vertex(normal, aabb)) + plane.w >= 0.0
        })
    }

    /// Classify an AABB against the frustum (3-way test).
    ///
    /// - If the p-vertex is outside any plane → `Outside` (early out)
    /// - If the n-vertex is outside any plane → at least `Partial`
    /// - If all n-vertices are inside all planes → `Inside`
    pub fn classify_aabb(&self, aabb: &AABB) -> FrustumTest {
        let mut all_inside = true;

        for plane in &self.planes {
            let normal = Vec3::new(plane.x, plane.y, plane.z);

            if normal.dot(Self::positive_vertex(normal, aabb)) + plane.w < 0.0 {
                return FrustumTest::Outside;
            }

            // Negative vertex: corner least in the direction of the normal
            let n_vertex = Vec3::new(
                if normal.x >= 0.0 { aabb.min.x } else { aabb.max.x },
                if normal.y >= 0.0 { aabb.min.y } else { aabb.max.y },
                if normal.z >= 0.0 { aabb.min.z } else { aabb.max.z },
            );

            if normal.dot(n_vertex) + plane.w < 0.0 {
                all_inside = false;
            }
        }

        if all_inside { FrustumTest::Inside } else { FrustumTest::Partial }
    }

    /// Corner of the box most aligned with the plane normal.
    fn positive_vertex(normal: Vec3, aabb: &AABB) -> Vec3 {
        Vec3::new(
            if normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
            if normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
            if normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
        )
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
