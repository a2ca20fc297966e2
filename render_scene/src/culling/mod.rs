//! Culling module: bounding volumes, layer masks and spatial indices.
//!
//! The render scene talks to spatial indices only through the
//! `SpatialIndex` trait. The caller chooses the implementation.

mod bounds;
mod layer_mask;
mod spatial_index;
mod octree_spatial_index;
mod linear_spatial_index;

pub use bounds::{Sphere, AABB};
pub use layer_mask::LayerMask;
pub use spatial_index::{CullResults, SpatialIndex};
pub use octree_spatial_index::OctreeSpatialIndex;
pub use linear_spatial_index::LinearSpatialIndex;
