//! Canonical registry of the points, edges and surfaces of one build.
//!
//! Geometry contributed by different regions that coincides after snapping
//! resolves to a single entity, which records every region it borders. The
//! tracker is owned by exactly one build and discarded afterwards.

pub mod edge;
pub mod point;
pub mod surface;

pub use edge::{EdgeData, EdgeId, OrientedEdge};
pub use point::{PointData, PointId};
pub use surface::{SurfaceData, SurfaceId};

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::error::TopologyError;
use crate::math::{GridKey, Normalizer, Point2};
use crate::mesh::brep::{BoundaryRepresentation, BrepEdge, BrepPoint, BrepSurface, SignedEdge};

/// Index of a region (a disjoint, material-tagged area) within one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub usize);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region{}", self.0)
    }
}

/// Lifecycle of a tracked point or edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// Referenced by at most one region.
    Registered,
    /// Borders two or more regions; meshing must keep it as a boundary.
    Interface,
    /// Emitted into a boundary representation; no longer mutable.
    Finalized,
}

/// Per-build entity registry.
#[derive(Debug)]
pub struct TopologyTracker {
    normalizer: Normalizer,
    points: SlotMap<PointId, PointData>,
    edges: SlotMap<EdgeId, EdgeData>,
    surfaces: SlotMap<SurfaceId, SurfaceData>,
    point_index: HashMap<GridKey, PointId>,
    edge_index: HashMap<(PointId, PointId), EdgeId>,
    finalized: bool,
}

impl TopologyTracker {
    /// Creates an empty tracker that identifies points with `normalizer`.
    #[must_use]
    pub fn new(normalizer: Normalizer) -> Self {
        Self {
            normalizer,
            points: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            surfaces: SlotMap::with_key(),
            point_index: HashMap::new(),
            edge_index: HashMap::new(),
            finalized: false,
        }
    }

    fn ensure_open(&self) -> Result<(), TopologyError> {
        if self.finalized {
            Err(TopologyError::Finalized)
        } else {
            Ok(())
        }
    }

    // --- Point operations ---

    /// Returns the point at `p` (after snapping), creating it on first
    /// reference, and adds `region` to its tag set.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::Finalized`] after [`finalize`](Self::finalize).
    pub fn register_point(&mut self, p: &Point2, region: RegionId) -> Result<PointId, TopologyError> {
        self.ensure_open()?;
        let id = self.intern_point(p);
        self.points[id].regions.insert(region);
        Ok(id)
    }

    fn intern_point(&mut self, p: &Point2) -> PointId {
        let key = self.normalizer.key(p);
        if let Some(&id) = self.point_index.get(&key) {
            return id;
        }
        let position = self.normalizer.snap_point(p);
        let id = self.points.insert(PointData::new(position, key));
        self.point_index.insert(key, id);
        id
    }

    /// Looks up the point at `p` without registering anything.
    #[must_use]
    pub fn find_point(&self, p: &Point2) -> Option<PointId> {
        self.point_index.get(&self.normalizer.key(p)).copied()
    }

    /// Returns the point data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the tracker.
    pub fn point(&self, id: PointId) -> Result<&PointData, TopologyError> {
        self.points
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("point".into()))
    }

    /// Lifecycle state of a point.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the tracker.
    pub fn point_state(&self, id: PointId) -> Result<EntityState, TopologyError> {
        let point = self.point(id)?;
        Ok(self.state_for(point.regions.len()))
    }

    // --- Edge operations ---

    /// Returns the undirected edge between `a` and `b`, creating it (and its
    /// endpoints) on first reference, and tags it and its endpoints with
    /// `region`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::DegenerateEdge`] if both endpoints snap to the
    /// same point, or [`TopologyError::Finalized`].
    pub fn register_edge(
        &mut self,
        a: &Point2,
        b: &Point2,
        region: RegionId,
    ) -> Result<OrientedEdge, TopologyError> {
        self.ensure_open()?;
        if self.normalizer.coincident(a, b) {
            return Err(TopologyError::DegenerateEdge);
        }
        let pa = self.register_point(a, region)?;
        let pb = self.register_point(b, region)?;
        let reversed = pa > pb;
        let key = if reversed { (pb, pa) } else { (pa, pb) };
        let id = match self.edge_index.get(&key) {
            Some(&id) => id,
            None => {
                let id = self.edges.insert(EdgeData {
                    start: key.0,
                    end: key.1,
                    regions: BTreeSet::new(),
                });
                self.edge_index.insert(key, id);
                id
            }
        };
        self.edges[id].regions.insert(region);
        Ok(OrientedEdge { edge: id, reversed })
    }

    /// Registers every edge of a closed ring, in ring order.
    ///
    /// # Errors
    ///
    /// Fails like [`register_edge`](Self::register_edge).
    pub fn register_ring(
        &mut self,
        ring: &[Point2],
        region: RegionId,
    ) -> Result<Vec<OrientedEdge>, TopologyError> {
        let n = ring.len();
        (0..n)
            .map(|i| self.register_edge(&ring[i], &ring[(i + 1) % n], region))
            .collect()
    }

    /// Looks up the edge between two points without registering anything.
    #[must_use]
    pub fn find_edge(&self, a: &Point2, b: &Point2) -> Option<EdgeId> {
        let pa = self.find_point(a)?;
        let pb = self.find_point(b)?;
        let key = if pa > pb { (pb, pa) } else { (pa, pb) };
        self.edge_index.get(&key).copied()
    }

    /// Returns the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the tracker.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeData, TopologyError> {
        self.edges
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    /// Lifecycle state of an edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the tracker.
    pub fn edge_state(&self, id: EdgeId) -> Result<EntityState, TopologyError> {
        let edge = self.edge(id)?;
        Ok(self.state_for(edge.regions.len()))
    }

    /// Regions referencing a point.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the tracker.
    pub fn point_tags(&self, id: PointId) -> Result<&BTreeSet<RegionId>, TopologyError> {
        Ok(&self.point(id)?.regions)
    }

    /// Regions bordering an edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the tracker.
    pub fn edge_tags(&self, id: EdgeId) -> Result<&BTreeSet<RegionId>, TopologyError> {
        Ok(&self.edge(id)?.regions)
    }

    /// Edges bordering at least two regions.
    pub fn interface_edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> {
        self.edges.iter().filter(|(_, e)| e.regions.len() >= 2)
    }

    // --- Surface operations ---

    /// Records the surface of `region`, bounded by previously registered loops.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::EntityNotFound`] if a loop references an
    /// unknown edge, or [`TopologyError::Finalized`].
    pub fn register_surface(
        &mut self,
        region: RegionId,
        loops: Vec<Vec<OrientedEdge>>,
    ) -> Result<SurfaceId, TopologyError> {
        self.ensure_open()?;
        for oe in loops.iter().flatten() {
            self.edge(oe.edge)?;
        }
        Ok(self.surfaces.insert(SurfaceData { region, loops }))
    }

    /// Returns the surface data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the tracker.
    pub fn surface(&self, id: SurfaceId) -> Result<&SurfaceData, TopologyError> {
        self.surfaces
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("surface".into()))
    }

    // --- Counts ---

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn state_for(&self, tags: usize) -> EntityState {
        if self.finalized {
            EntityState::Finalized
        } else if tags >= 2 {
            EntityState::Interface
        } else {
            EntityState::Registered
        }
    }

    /// Emits every entity, in creation order, as a boundary representation
    /// and freezes the tracker.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::Finalized`] if called twice.
    pub fn finalize(&mut self) -> Result<BoundaryRepresentation, TopologyError> {
        self.ensure_open()?;
        self.finalized = true;

        // Slot maps without removals iterate in insertion order.
        let mut point_slot: HashMap<PointId, usize> = HashMap::with_capacity(self.points.len());
        let points = self
            .points
            .iter()
            .enumerate()
            .map(|(i, (id, data))| {
                point_slot.insert(id, i);
                BrepPoint {
                    position: data.position,
                    regions: data.regions.iter().copied().collect(),
                }
            })
            .collect();

        let mut edge_slot: HashMap<EdgeId, usize> = HashMap::with_capacity(self.edges.len());
        let mut edges = Vec::with_capacity(self.edges.len());
        for (i, (id, data)) in self.edges.iter().enumerate() {
            edge_slot.insert(id, i);
            edges.push(BrepEdge {
                start: point_slot[&data.start],
                end: point_slot[&data.end],
                regions: data.regions.iter().copied().collect(),
            });
        }

        let surfaces = self
            .surfaces
            .values()
            .map(|s| BrepSurface {
                region: s.region,
                loops: s
                    .loops
                    .iter()
                    .map(|l| {
                        l.iter()
                            .map(|oe| SignedEdge {
                                edge: edge_slot[&oe.edge],
                                reversed: oe.reversed,
                            })
                            .collect()
                    })
                    .collect(),
            })
            .collect();

        Ok(BoundaryRepresentation {
            points,
            edges,
            surfaces,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn tracker() -> TopologyTracker {
        TopologyTracker::new(Normalizer::new(1e-3).unwrap())
    }

    fn unit_square(x: f64) -> Vec<Point2> {
        vec![p(x, 0.0), p(x + 1.0, 0.0), p(x + 1.0, 1.0), p(x, 1.0)]
    }

    #[test]
    fn coincident_points_resolve_to_one_entity() {
        let mut t = tracker();
        let a = t.register_point(&p(1.0, 1.0), RegionId(0)).unwrap();
        let b = t.register_point(&p(1.000_2, 0.999_9), RegionId(1)).unwrap();
        assert_eq!(a, b);
        assert_eq!(t.point_count(), 1);
        assert_eq!(t.point_state(a).unwrap(), EntityState::Interface);
        let tags: Vec<_> = t.point_tags(a).unwrap().iter().copied().collect();
        assert_eq!(tags, vec![RegionId(0), RegionId(1)]);
    }

    #[test]
    fn retagging_is_idempotent() {
        let mut t = tracker();
        let a = t.register_point(&p(0.0, 0.0), RegionId(3)).unwrap();
        t.register_point(&p(0.0, 0.0), RegionId(3)).unwrap();
        assert_eq!(t.point(a).unwrap().regions.len(), 1);
        assert_eq!(t.point_state(a).unwrap(), EntityState::Registered);
    }

    #[test]
    fn edges_are_undirected() {
        let mut t = tracker();
        let fwd = t.register_edge(&p(0.0, 0.0), &p(1.0, 0.0), RegionId(0)).unwrap();
        let back = t.register_edge(&p(1.0, 0.0), &p(0.0, 0.0), RegionId(1)).unwrap();
        assert_eq!(fwd.edge, back.edge);
        assert_ne!(fwd.reversed, back.reversed);
        assert_eq!(t.edge_count(), 1);
        assert_eq!(t.edge_state(fwd.edge).unwrap(), EntityState::Interface);
        assert_eq!(t.edge_tags(fwd.edge).unwrap().len(), 2);
        assert_eq!(t.find_edge(&p(1.0, 0.0), &p(0.0, 0.0)), Some(fwd.edge));
    }

    #[test]
    fn shared_segment_registered_once() {
        let mut t = tracker();
        let left = t.register_ring(&unit_square(0.0), RegionId(0)).unwrap();
        let right = t.register_ring(&unit_square(1.0), RegionId(1)).unwrap();
        t.register_surface(RegionId(0), vec![left]).unwrap();
        t.register_surface(RegionId(1), vec![right]).unwrap();
        assert_eq!(t.point_count(), 6);
        assert_eq!(t.edge_count(), 7);
        assert_eq!(t.interface_edges().count(), 1);

        let brep = t.finalize().unwrap();
        assert_eq!(brep.edges.len(), 7);
        assert_eq!(brep.interface_edges().count(), 1);
        assert_eq!(brep.surfaces.len(), 2);
    }

    #[test]
    fn degenerate_edge_rejected() {
        let mut t = tracker();
        let err = t.register_edge(&p(0.0, 0.0), &p(0.000_1, 0.0), RegionId(0)).unwrap_err();
        assert_eq!(err, TopologyError::DegenerateEdge);
    }

    #[test]
    fn finalized_tracker_is_frozen() {
        let mut t = tracker();
        let e = t.register_edge(&p(0.0, 0.0), &p(1.0, 0.0), RegionId(0)).unwrap();
        t.finalize().unwrap();
        assert!(t.is_finalized());
        assert_eq!(t.edge_state(e.edge).unwrap(), EntityState::Finalized);
        assert_eq!(
            t.register_point(&p(2.0, 2.0), RegionId(0)).unwrap_err(),
            TopologyError::Finalized
        );
        assert_eq!(t.finalize().unwrap_err(), TopologyError::Finalized);
    }

    #[test]
    fn surface_with_unknown_edge_rejected() {
        let mut other = tracker();
        let foreign = other.register_edge(&p(0.0, 0.0), &p(1.0, 0.0), RegionId(0)).unwrap();
        let mut t = tracker();
        assert!(t.register_surface(RegionId(0), vec![vec![foreign]]).is_err());
    }
}
