use std::collections::BTreeSet;

use super::RegionId;
use crate::math::{GridKey, Point2};

slotmap::new_key_type! {
    /// Unique identifier for a point in the topology tracker.
    pub struct PointId;
}

/// Data associated with a tracked point.
#[derive(Debug, Clone)]
pub struct PointData {
    /// Snapped position.
    pub position: Point2,
    /// Grid key the point is indexed under.
    pub key: GridKey,
    /// Regions whose boundary passes through this point.
    pub regions: BTreeSet<RegionId>,
}

impl PointData {
    #[must_use]
    pub fn new(position: Point2, key: GridKey) -> Self {
        Self {
            position,
            key,
            regions: BTreeSet::new(),
        }
    }
}
