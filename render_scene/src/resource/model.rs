/// Model resource: bounding radius, skeleton, submeshes and LOD table.
///
/// A `Model` is created empty by the ResourceManager when first requested
/// and becomes ready when its `ModelData` arrives. Readiness can be lost
/// again (unload, hot reload); holders must re-read `data()` on every
/// asset event.

use std::sync::{Arc, PoisonError, RwLock};
use glam::{Quat, Vec3};
use slotmap::new_key_type;
use crate::error::Result;
use crate::prism_bail;
use super::material::Material;
use super::mesh::{Mesh, MeshDesc};

new_key_type! {
    /// Stable key of a model inside the ResourceManager
    pub struct ModelKey;
}

// ============================================================================
// SKELETON
// ============================================================================

/// Bind-pose bone
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
}

/// Per-instance skeleton pose, initialized from the model's bind pose
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub positions: Vec<Vec3>,
    pub rotations: Vec<Quat>,
}

impl Pose {
    pub fn from_bones(bones: &[Bone]) -> Self {
        Self {
            positions: bones.iter().map(|b| b.position).collect(),
            rotations: bones.iter().map(|b| b.rotation).collect(),
        }
    }

    pub fn bone_count(&self) -> usize {
        self.positions.len()
    }
}

// ============================================================================
// LEVEL OF DETAIL
// ============================================================================

/// One level of detail.
///
/// LOD `i` draws meshes `(lods[i-1].to_mesh + 1)..=lods[i].to_mesh` for
/// viewers closer than `distance`. The last LOD has no upper distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lod {
    /// Last mesh index (inclusive) of this LOD
    pub to_mesh: usize,
    /// Upper view distance (world units) of this LOD
    pub distance: f32,
}

/// Inclusive submesh index range of one LOD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LodMeshIndices {
    pub from: usize,
    pub to: usize,
}

impl LodMeshIndices {
    pub fn iter(&self) -> std::ops::RangeInclusive<usize> {
        self.from..=self.to
    }
}

// ============================================================================
// MODEL DATA
// ============================================================================

/// Model descriptor
#[derive(Debug, Clone, Default)]
pub struct ModelDesc {
    pub bounding_radius: f32,
    pub bones: Vec<Bone>,
    pub meshes: Vec<MeshDesc>,
    /// Sorted by increasing distance. Empty = one LOD with every mesh.
    pub lods: Vec<Lod>,
}

/// Loaded model contents (immutable once built)
#[derive(Debug)]
pub struct ModelData {
    bounding_radius: f32,
    bones: Vec<Bone>,
    meshes: Arc<[Mesh]>,
    lods: Vec<Lod>,
}

impl ModelData {
    /// Build model data, binding `materials[i]` to mesh `i` (internal use by ResourceManager)
    pub(crate) fn from_desc(desc: ModelDesc, materials: Vec<Arc<Material>>) -> Result<Self> {
        const SOURCE: &str = "prism::Model";

        // ========== VALIDATION 1: one material per mesh ==========
        if desc.meshes.len() != materials.len() {
            prism_bail!(SOURCE, "{} meshes but {} materials", desc.meshes.len(), materials.len());
        }

        // ========== VALIDATION 2: bounding radius ==========
        if desc.bounding_radius.is_nan() || desc.bounding_radius < 0.0 {
            prism_bail!(SOURCE, "Invalid bounding radius {}", desc.bounding_radius);
        }

        // ========== VALIDATION 3: LOD table ==========
        let mut previous: Option<&Lod> = None;
        for lod in &desc.lods {
            if lod.to_mesh >= desc.meshes.len() {
                prism_bail!(SOURCE, "LOD ends at mesh {} of {}", lod.to_mesh, desc.meshes.len());
            }
            if let Some(prev) = previous {
                if lod.to_mesh <= prev.to_mesh || lod.distance < prev.distance {
                    prism_bail!(SOURCE, "LOD table is not sorted");
                }
            }
            previous = Some(lod);
        }

        let meshes: Arc<[Mesh]> = desc
            .meshes
            .iter()
            .zip(materials)
            .map(|(mesh, material)| Mesh::new(&mesh.name, Some(material)))
            .collect();

        Ok(Self {
            bounding_radius: desc.bounding_radius,
            bones: desc.bones,
            meshes,
            lods: desc.lods,
        })
    }

    pub fn bounding_radius(&self) -> f32 {
        self.bounding_radius
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// Shared submesh array
    pub fn meshes(&self) -> &Arc<[Mesh]> {
        &self.meshes
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn lods(&self) -> &[Lod] {
        &self.lods
    }

    /// Submesh range to draw for a viewer at `squared_distance`.
    ///
    /// `None` for a model without meshes. Monotone: a larger distance
    /// never selects a finer LOD.
    pub fn lod_mesh_indices(&self, squared_distance: f32) -> Option<LodMeshIndices> {
        let last_mesh = self.meshes.len().checked_sub(1)?;
        if self.lods.is_empty() {
            return Some(LodMeshIndices { from: 0, to: last_mesh });
        }

        let last_lod = self.lods.len() - 1;
        let index = self
            .lods
            .iter()
            .position(|lod| squared_distance < lod.distance * lod.distance)
            .unwrap_or(last_lod);

        let from = if index == 0 { 0 } else { self.lods[index - 1].to_mesh + 1 };
        Some(LodMeshIndices { from, to: self.lods[index].to_mesh })
    }
}

// ============================================================================
// MODEL
// ============================================================================

/// Model resource handle, shared by path
#[derive(Debug)]
pub struct Model {
    key: ModelKey,
    path: String,
    data: RwLock<Option<Arc<ModelData>>>,
}

impl Model {
    /// Create an empty (not ready) model (internal use by ResourceManager)
    pub(crate) fn new(key: ModelKey, path: &str) -> Self {
        Self {
            key,
            path: path.to_string(),
            data: RwLock::new(None),
        }
    }

    pub fn key(&self) -> ModelKey {
        self.key
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_ready(&self) -> bool {
        self.data.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Loaded contents, `None` while not ready
    pub fn data(&self) -> Option<Arc<ModelData>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub(crate) fn set_data(&self, data: Option<Arc<ModelData>>) -> Option<Arc<ModelData>> {
        std::mem::replace(&mut *self.data.write().unwrap_or_else(PoisonError::into_inner), data)
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
