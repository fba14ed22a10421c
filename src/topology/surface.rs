use super::edge::OrientedEdge;
use super::RegionId;

slotmap::new_key_type! {
    /// Unique identifier for a surface in the topology tracker.
    pub struct SurfaceId;
}

/// A planar region bounded by closed edge loops.
///
/// The first loop is the outer boundary (counter-clockwise), the rest are
/// holes (clockwise).
#[derive(Debug, Clone)]
pub struct SurfaceData {
    pub region: RegionId,
    pub loops: Vec<Vec<OrientedEdge>>,
}
