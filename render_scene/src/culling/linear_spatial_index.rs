/// LinearSpatialIndex: flat array of spheres, culled in fixed-size chunks.
///
/// No hierarchy: every cull tests every entry. Entries are stored densely
/// (swap-remove on delete) and each chunk of `batch_size` entries becomes
/// one sub-batch, tested in parallel on the current rayon pool.
/// Suited to small scenes and used as the brute-force reference in tests.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use crate::camera::Frustum;
use crate::universe::ComponentHandle;
use super::bounds::Sphere;
use super::layer_mask::LayerMask;
use super::spatial_index::{CullResults, SpatialIndex};

#[derive(Debug, Clone, Copy)]
struct Entry {
    handle: ComponentHandle,
    sphere: Sphere,
    layer_mask: LayerMask,
}

pub struct LinearSpatialIndex {
    entries: Vec<Entry>,
    /// handle → slot in `entries`
    slots: FxHashMap<ComponentHandle, usize>,
    batch_size: usize,
}

impl LinearSpatialIndex {
    /// Create an empty index. A `batch_size` of 0 is treated as 1.
    pub fn new(batch_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            slots: FxHashMap::default(),
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl SpatialIndex for LinearSpatialIndex {
    fn add_static(&mut self, handle: ComponentHandle, sphere: Sphere, layer_mask: LayerMask) {
        let entry = Entry { handle, sphere, layer_mask };
        match self.slots.get(&handle) {
            Some(&slot) => self.entries[slot] = entry,
            None => {
                self.slots.insert(handle, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    fn remove_static(&mut self, handle: ComponentHandle) {
        let Some(slot) = self.slots.remove(&handle) else {
            return;
        };
        self.entries.swap_remove(slot);
        if let Some(moved) = self.entries.get(slot) {
            self.slots.insert(moved.handle, slot);
        }
    }

    fn update_sphere(&mut self, handle: ComponentHandle, sphere: Sphere) {
        if let Some(&slot) = self.slots.get(&handle) {
            self.entries[slot].sphere = sphere;
        }
    }

    fn is_added(&self, handle: ComponentHandle) -> bool {
        self.slots.contains_key(&handle)
    }

    fn sphere(&self, handle: ComponentHandle) -> Option<Sphere> {
        self.slots.get(&handle).map(|&slot| self.entries[slot].sphere)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn cull_to_frustum(&self, frustum: &Frustum, layer_mask: LayerMask) -> CullResults {
        self.entries
            .par_chunks(self.batch_size)
            .map(|chunk| {
                chunk
                    .iter()
                    .filter(|e| e.layer_mask.matches(layer_mask) && frustum.intersects_sphere(&e.sphere))
                    .map(|e| e.handle)
                    .collect::<Vec<ComponentHandle>>()
            })
            .collect()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.slots.clear();
    }
}

#[cfg(test)]
#[path = "linear_spatial_index_tests.rs"]
mod tests;
