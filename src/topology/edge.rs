use std::collections::BTreeSet;

use super::point::PointId;
use super::RegionId;

slotmap::new_key_type! {
    /// Unique identifier for an edge in the topology tracker.
    pub struct EdgeId;
}

/// Data associated with a tracked, undirected straight edge.
///
/// `start` and `end` are stored in ascending id order; direction of use is
/// carried by [`OrientedEdge`].
#[derive(Debug, Clone)]
pub struct EdgeData {
    pub start: PointId,
    pub end: PointId,
    /// Regions bordering this edge.
    pub regions: BTreeSet<RegionId>,
}

/// An edge together with the direction a loop walks it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientedEdge {
    pub edge: EdgeId,
    /// `true` if the loop runs from `end` to `start`.
    pub reversed: bool,
}
