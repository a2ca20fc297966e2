/// OctreeSpatialIndex: static octree spatial index for frustum culling.
///
/// Single-node placement: each renderable is stored in exactly one node,
/// the deepest node whose AABB fully contains the sphere's bounding box.
/// If the box straddles a child boundary, it stays in the parent.
/// Renderables outside the world bounds are stored at the root.
///
/// The tree structure is pre-allocated at construction time (static octree)
/// with a fixed `max_depth`. All 8^d nodes exist regardless of occupancy.
///
/// Culling produces 9 sub-batches: the root's own objects, then one per
/// top-level octant. The octants are walked in parallel on the current
/// rayon pool.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use glam::Vec3;
use crate::camera::{Frustum, FrustumTest};
use crate::universe::ComponentHandle;
use super::bounds::{Sphere, AABB};
use super::layer_mask::LayerMask;
use super::spatial_index::{CullResults, SpatialIndex};

/// Index of the root node in the flat node array.
const ROOT: usize = 0;

/// A single node in the octree.
struct OctreeNode {
    /// World-space AABB of this node
    aabb: AABB,
    /// Index of the first child in the flat array (0 = no children / leaf)
    first_child: usize,
    /// Renderables that don't fit in any child
    objects: Vec<ComponentHandle>,
}

/// Per-renderable entry
#[derive(Debug, Clone, Copy)]
struct Entry {
    node: usize,
    sphere: Sphere,
    aabb: AABB,
    layer_mask: LayerMask,
}

/// Static octree spatial index.
pub struct OctreeSpatialIndex {
    /// Flat array of all octree nodes (pre-allocated, depth-first)
    nodes: Vec<OctreeNode>,
    /// Maximum depth of the tree (root = depth 0)
    max_depth: u32,
    /// Reverse lookup: handle → entry, for O(1) remove without traversal
    entries: FxHashMap<ComponentHandle, Entry>,
    /// subtree_sizes[d] = total node count for a subtree of depth d
    subtree_sizes: Vec<usize>,
}

impl OctreeSpatialIndex {
    /// Create a new static octree with the given world bounds and depth.
    ///
    /// # Arguments
    ///
    /// * `world_aabb` - The world-space AABB encompassing the scene
    /// * `max_depth` - Maximum tree depth (root = 0). Total nodes = (8^(d+1) - 1) / 7.
    ///   Typical values: 3–5.
    pub fn new(world_aabb: AABB, max_depth: u32) -> Self {
        let total_nodes = Self::total_node_count(max_depth);
        let mut nodes = Vec::with_capacity(total_nodes);

        Self::build_recursive(&mut nodes, &world_aabb, 0, max_depth);

        debug_assert_eq!(nodes.len(), total_nodes);

        let subtree_sizes: Vec<usize> = (0..=max_depth).map(Self::total_node_count).collect();

        Self {
            nodes,
            max_depth,
            entries: FxHashMap::default(),
            subtree_sizes,
        }
    }

    /// Total number of nodes for a given depth: (8^(d+1) - 1) / 7
    fn total_node_count(max_depth: u32) -> usize {
        let mut count = 0usize;
        let mut level_count = 1usize;
        for _ in 0..=max_depth {
            count += level_count;
            level_count *= 8;
        }
        count
    }

    fn build_recursive(
        nodes: &mut Vec<OctreeNode>,
        aabb: &AABB,
        depth: u32,
        max_depth: u32,
    ) {
        let node_index = nodes.len();
        nodes.push(OctreeNode {
            aabb: *aabb,
            first_child: 0,
            objects: Vec::new(),
        });

        if depth >= max_depth {
            return;
        }

        let center = aabb.center();
        nodes[node_index].first_child = nodes.len();

        for octant in 0..8u8 {
            let child_aabb = Self::octant_aabb(aabb, &center, octant);
            Self::build_recursive(nodes, &child_aabb, depth + 1, max_depth);
        }
    }

    /// AABB of an octant. Bit layout: bit0 = X, bit1 = Y, bit2 = Z (0 = low half).
    fn octant_aabb(parent: &AABB, center: &Vec3, octant: u8) -> AABB {
        AABB {
            min: Vec3::new(
                if octant & 1 == 0 { parent.min.x } else { center.x },
                if octant & 2 == 0 { parent.min.y } else { center.y },
                if octant & 4 == 0 { parent.min.z } else { center.z },
            ),
            max: Vec3::new(
                if octant & 1 == 0 { center.x } else { parent.max.x },
                if octant & 2 == 0 { center.y } else { parent.max.y },
                if octant & 4 == 0 { center.z } else { parent.max.z },
            ),
        }
    }

    fn point_octant(center: &Vec3, point: &Vec3) -> u8 {
        ((point.x >= center.x) as u8)
            | (((point.y >= center.y) as u8) << 1)
            | (((point.z >= center.z) as u8) << 2)
    }

    /// Deepest node that fully contains a box.
    ///
    /// If both box corners fall into the same octant the box fits in that
    /// child; otherwise it straddles a boundary and stays in the current node.
    fn find_target_node(&self, aabb: &AABB) -> usize {
        if !self.nodes[ROOT].aabb.contains(aabb) {
            return ROOT;
        }

        let mut node_idx = ROOT;
        let mut depth = 0;

        loop {
            let first_child = self.nodes[node_idx].first_child;
            if depth >= self.max_depth || first_child == 0 {
                return node_idx;
            }

            let center = self.nodes[node_idx].aabb.center();
            let min_oct = Self::point_octant(&center, &aabb.min);
            let max_oct = Self::point_octant(&center, &aabb.max);

            if min_oct != max_oct {
                return node_idx;
            }

            node_idx = first_child + self.subtree_offset(min_oct, self.max_depth - depth - 1);
            depth += 1;
        }
    }

    /// Offset of octant `i` in the depth-first node layout.
    fn subtree_offset(&self, octant: u8, remaining_depth: u32) -> usize {
        octant as usize * self.subtree_sizes[remaining_depth as usize]
    }

    fn child_index(&self, node_idx: usize, octant: u8, depth: u32) -> usize {
        self.nodes[node_idx].first_child + self.subtree_offset(octant, self.max_depth - depth - 1)
    }

    fn test_object(&self, handle: ComponentHandle, frustum: &Frustum, mask: LayerMask) -> bool {
        self.entries
            .get(&handle)
            .is_some_and(|e| e.layer_mask.matches(mask) && frustum.intersects_sphere(&e.sphere))
    }

    /// 3-way classification at each node:
    /// - `Outside` → skip entire subtree
    /// - `Inside` → collect the subtree with the layer test only
    /// - `Partial` → test objects individually, recurse into children
    fn query_recursive(
        &self,
        node_idx: usize,
        frustum: &Frustum,
        mask: LayerMask,
        depth: u32,
        results: &mut Vec<ComponentHandle>,
    ) {
        match frustum.classify_aabb(&self.nodes[node_idx].aabb) {
            FrustumTest::Outside => {}
            FrustumTest::Inside => self.collect_all(node_idx, mask, depth, results),
            FrustumTest::Partial => {
                let node = &self.nodes[node_idx];
                results.extend(
                    node.objects.iter().copied().filter(|&h| self.test_object(h, frustum, mask)),
                );

                if depth < self.max_depth && node.first_child != 0 {
                    for octant in 0..8u8 {
                        let child_idx = self.child_index(node_idx, octant, depth);
                        self.query_recursive(child_idx, frustum, mask, depth + 1, results);
                    }
                }
            }
        }
    }

    fn collect_all(
        &self,
        node_idx: usize,
        mask: LayerMask,
        depth: u32,
        results: &mut Vec<ComponentHandle>,
    ) {
        let node = &self.nodes[node_idx];
        results.extend(node.objects.iter().copied().filter(|h| {
            self.entries.get(h).is_some_and(|e| e.layer_mask.matches(mask))
        }));

        if depth < self.max_depth && node.first_child != 0 {
            for octant in 0..8u8 {
                let child_idx = self.child_index(node_idx, octant, depth);
                self.collect_all(child_idx, mask, depth + 1, results);
            }
        }
    }

    fn detach(&mut self, handle: ComponentHandle, node_idx: usize) {
        let objects = &mut self.nodes[node_idx].objects;
        if let Some(pos) = objects.iter().position(|&h| h == handle) {
            objects.swap_remove(pos);
        }
    }
}

// ===== SPATIAL INDEX TRAIT =====

impl SpatialIndex for OctreeSpatialIndex {
    fn add_static(&mut self, handle: ComponentHandle, sphere: Sphere, layer_mask: LayerMask) {
        self.remove_static(handle);

        let aabb = AABB::from_sphere(&sphere);
        let node = self.find_target_node(&aabb);
        self.nodes[node].objects.push(handle);
        self.entries.insert(handle, Entry { node, sphere, aabb, layer_mask });
    }

    fn remove_static(&mut self, handle: ComponentHandle) {
        if let Some(entry) = self.entries.remove(&handle) {
            self.detach(handle, entry.node);
        }
    }

    fn update_sphere(&mut self, handle: ComponentHandle, sphere: Sphere) {
        let Some(entry) = self.entries.get(&handle).copied() else {
            return;
        };

        let aabb = AABB::from_sphere(&sphere);
        let target = self.find_target_node(&aabb);

        if entry.node != target {
            self.detach(handle, entry.node);
            self.nodes[target].objects.push(handle);
        }
        self.entries.insert(handle, Entry { node: target, sphere, aabb, ..entry });
    }

    fn is_added(&self, handle: ComponentHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    fn sphere(&self, handle: ComponentHandle) -> Option<Sphere> {
        self.entries.get(&handle).map(|e| e.sphere)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn cull_to_frustum(&self, frustum: &Frustum, layer_mask: LayerMask) -> CullResults {
        // Root objects include everything outside the world bounds, so
        // they are tested whatever the root classification.
        let root_batch: Vec<ComponentHandle> = self.nodes[ROOT]
            .objects
            .iter()
            .copied()
            .filter(|&h| self.test_object(h, frustum, layer_mask))
            .collect();

        let mut results = vec![root_batch];
        if self.max_depth == 0 || frustum.classify_aabb(&self.nodes[ROOT].aabb) == FrustumTest::Outside {
            return results;
        }

        let octants: CullResults = (0..8usize)
            .into_par_iter()
            .map(|octant| {
                let mut batch = Vec::new();
                let child_idx = self.child_index(ROOT, octant as u8, 0);
                self.query_recursive(child_idx, frustum, layer_mask, 1, &mut batch);
                batch
            })
            .collect();

        results.extend(octants);
        results
    }

    fn clear(&mut self) {
        for node in &mut self.nodes {
            node.objects.clear();
        }
        self.entries.clear();
    }
}

#[cfg(test)]
#[path = "octree_spatial_index_tests.rs"]
mod tests;
