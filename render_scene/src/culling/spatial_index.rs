/// Spatial acceleration structures for visibility and light queries.
///
/// A SpatialIndex stores one bounding sphere and one layer mask per
/// renderable handle. Culling returns the handles grouped into sub-batches
/// chosen by the implementation; the render scene schedules one LOD job
/// per non-empty sub-batch.
///
/// Ownership: the caller creates the SpatialIndex and hands it to the
/// RenderScene, which is its only writer.

use crate::camera::Frustum;
use crate::universe::ComponentHandle;
use super::bounds::Sphere;
use super::layer_mask::LayerMask;

/// Cull output: handles partitioned into sub-batches (some may be empty).
pub type CullResults = Vec<Vec<ComponentHandle>>;

/// Trait for spatial indexing of renderables.
pub trait SpatialIndex: Send + Sync {
    /// Add a renderable. Re-adding an existing handle replaces its entry.
    fn add_static(&mut self, handle: ComponentHandle, sphere: Sphere, layer_mask: LayerMask);

    /// Remove a renderable. Unknown handles are ignored.
    fn remove_static(&mut self, handle: ComponentHandle);

    /// Move a renderable's sphere. Unknown handles are ignored.
    fn update_sphere(&mut self, handle: ComponentHandle, sphere: Sphere);

    /// Whether the handle currently has an entry.
    fn is_added(&self, handle: ComponentHandle) -> bool;

    /// Stored sphere of a handle.
    fn sphere(&self, handle: ComponentHandle) -> Option<Sphere>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All handles whose sphere intersects the frustum and whose layer mask
    /// shares a bit with `layer_mask`. No handle appears twice.
    ///
    /// Implementations may fan out on the current rayon pool; the call
    /// returns once every sub-batch is complete.
    fn cull_to_frustum(&self, frustum: &Frustum, layer_mask: LayerMask) -> CullResults;

    /// Remove all entries.
    fn clear(&mut self);
}
