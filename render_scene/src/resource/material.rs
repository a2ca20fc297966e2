/// Resource-level material type.
///
/// The render scene only needs two facts about a material: which render
/// layers it draws in and how many terrain-style blend layers it has
/// (a nonzero count makes a model instance "multilayer").
///
/// A material is identified by its path. It is ready once its description
/// is known to the resource manager; until then it reports the default
/// layer and zero blend layers.

use std::sync::{PoisonError, RwLock};
use crate::culling::LayerMask;

// ===== DESCRIPTORS =====

/// Material description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialDesc {
    /// Render layers this material draws in
    pub layer_mask: LayerMask,
    /// Number of blend layers (0 for ordinary materials)
    pub layer_count: u32,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            layer_mask: LayerMask::DEFAULT,
            layer_count: 0,
        }
    }
}

// ===== MATERIAL =====

/// Material resource, shared by path and reference counted by the ResourceManager
#[derive(Debug)]
pub struct Material {
    path: String,
    desc: RwLock<Option<MaterialDesc>>,
}

impl Material {
    /// Create a material (internal use by ResourceManager)
    pub(crate) fn new(path: &str, desc: Option<MaterialDesc>) -> Self {
        Self {
            path: path.to_string(),
            desc: RwLock::new(desc),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_ready(&self) -> bool {
        self.desc().is_some()
    }

    /// Render layer mask (`LayerMask::DEFAULT` while not ready)
    pub fn layer_mask(&self) -> LayerMask {
        self.desc().map_or(LayerMask::DEFAULT, |d| d.layer_mask)
    }

    /// Blend layer count (0 while not ready)
    pub fn layer_count(&self) -> u32 {
        self.desc().map_or(0, |d| d.layer_count)
    }

    fn desc(&self) -> Option<MaterialDesc> {
        *self.desc.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_desc(&self, desc: Option<MaterialDesc>) {
        *self.desc.write().unwrap_or_else(PoisonError::into_inner) = desc;
    }
}
