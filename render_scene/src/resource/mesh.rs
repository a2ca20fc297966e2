//! Resource-level mesh types.
//!
//! A `Mesh` is one submesh of a model: a named drawable range bound to a
//! material. Models share an immutable `Arc<[Mesh]>` with every instance;
//! an instance that overrides materials owns a private copy instead.

use std::sync::Arc;
use super::material::Material;

// ============================================================================
// MESH
// ============================================================================

/// A submesh of a model bound to a material.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    name: String,
    /// None only in instance-owned copies, for slots not bound yet
    material: Option<Arc<Material>>,
}

impl Mesh {
    pub fn new(name: &str, material: Option<Arc<Material>>) -> Self {
        Self {
            name: name.to_string(),
            material,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn material(&self) -> Option<&Arc<Material>> {
        self.material.as_ref()
    }

    /// Material path, empty when unbound
    pub fn material_path(&self) -> &str {
        self.material.as_ref().map_or("", |m| m.path())
    }

    pub(crate) fn set_material(&mut self, material: Option<Arc<Material>>) {
        self.material = material;
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }
}

// ============================================================================
// DESCRIPTOR
// ============================================================================

/// Mesh descriptor: the material is given by path and resolved at load
#[derive(Debug, Clone)]
pub struct MeshDesc {
    pub name: String,
    pub material: String,
}
