use serde::{Deserialize, Serialize};
use crate::universe::{ComponentHandle, Entity};
use crate::prism_warn;
use super::render_scene::{RenderScene, SOURCE};

/// Terrain parameters. Height-field storage and meshing live elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terrain {
    pub entity: Entity,
    pub material_path: String,
    /// Horizontal size of one height-field cell
    pub xz_scale: f32,
    /// Height of the maximum height-field value
    pub y_scale: f32,
}

impl Terrain {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            material_path: String::new(),
            xz_scale: 1.0,
            y_scale: 1.0,
        }
    }
}

impl RenderScene {
    pub fn create_terrain(&mut self, entity: Entity) -> ComponentHandle {
        self.terrains.entry(entity).or_insert_with(|| Terrain::new(entity));
        ComponentHandle::from_entity(entity)
    }

    pub fn destroy_terrain(&mut self, handle: ComponentHandle) -> bool {
        if self.terrains.remove(&handle.entity()).is_none() {
            prism_warn!(SOURCE, "Destroying unknown terrain {}", handle.0);
            return false;
        }
        true
    }

    pub fn terrain(&self, handle: ComponentHandle) -> Option<&Terrain> {
        self.terrains.get(&handle.entity())
    }

    pub fn terrain_mut(&mut self, handle: ComponentHandle) -> Option<&mut Terrain> {
        self.terrains.get_mut(&handle.entity())
    }
}
