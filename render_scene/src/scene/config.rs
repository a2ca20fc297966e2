/// RenderScene configuration.
///
/// Plain data, loadable from JSON. Every field has a default so partial
/// documents are accepted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSceneConfig {
    /// Worker threads for culling and LOD jobs (0 = one per core)
    pub worker_threads: usize,
    /// Global LOD distance multiplier
    pub lod_multiplier: f32,
    /// Field of view (radians) at which `lod_multiplier` applies unscaled
    pub lod_reference_fov: f32,
    /// Model instance slots reserved up front
    pub model_instance_capacity: usize,
    /// Upper bound for `closest_point_lights`
    pub max_closest_lights: usize,
}

impl Default for RenderSceneConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            lod_multiplier: 1.0,
            lod_reference_fov: 60.0_f32.to_radians(),
            model_instance_capacity: 5000,
            max_closest_lights: 16,
        }
    }
}

impl RenderSceneConfig {
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
