use glam::Vec3;
use serde::{Deserialize, Serialize};
use crate::universe::{ComponentHandle, Entity};
use crate::prism_warn;
use super::render_scene::{RenderScene, SOURCE};

/// Environment probe. The guid names the probe's baked cubemaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentProbe {
    pub entity: Entity,
    pub guid: u64,
}

impl EnvironmentProbe {
    pub fn new(entity: Entity) -> Self {
        Self { entity, guid: rand::random() }
    }
}

impl RenderScene {
    pub fn create_environment_probe(&mut self, entity: Entity) -> ComponentHandle {
        self.environment_probes.entry(entity).or_insert_with(|| EnvironmentProbe::new(entity));
        ComponentHandle::from_entity(entity)
    }

    pub fn destroy_environment_probe(&mut self, handle: ComponentHandle) -> bool {
        if self.environment_probes.remove(&handle.entity()).is_none() {
            prism_warn!(SOURCE, "Destroying unknown environment probe {}", handle.0);
            return false;
        }
        true
    }

    pub fn environment_probe(&self, handle: ComponentHandle) -> Option<&EnvironmentProbe> {
        self.environment_probes.get(&handle.entity())
    }

    /// Give the probe a new guid so its cubemaps are baked again.
    pub fn reload_environment_probe(&mut self, handle: ComponentHandle) -> bool {
        let Some(probe) = self.environment_probes.get_mut(&handle.entity()) else {
            return false;
        };
        probe.guid = rand::random();
        true
    }

    /// Probe nearest to `position`.
    pub fn nearest_environment_probe(&self, position: Vec3) -> Option<ComponentHandle> {
        self.environment_probes
            .keys()
            .map(|&entity| (entity, self.universe.position(entity).distance_squared(position)))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(entity, _)| ComponentHandle::from_entity(entity))
    }
}
