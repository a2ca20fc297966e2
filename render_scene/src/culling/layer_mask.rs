use bitflags::bitflags;

bitflags! {
    /// Render layer bitmask.
    ///
    /// A renderable's mask is the union of its submesh material layers.
    /// Culls only return renderables whose mask shares a bit with the query mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LayerMask: u64 {
        /// Layer 0, used for renderables whose model is not ready yet
        const DEFAULT = 1;
        const _ = !0;
    }
}

impl LayerMask {
    /// Mask with the single bit of `layer` set (layers above 63 map to nothing).
    pub fn layer(layer: u32) -> Self {
        Self::from_bits_retain(1u64.checked_shl(layer).unwrap_or(0))
    }

    /// Whether this mask shares at least one bit with `query`.
    pub fn matches(self, query: LayerMask) -> bool {
        self.intersects(query)
    }
}
