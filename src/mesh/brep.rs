use crate::math::polygon_2d::{point_in_ring, signed_area};
use crate::math::Point2;
use crate::topology::RegionId;

/// A boundary point handed to the mesher.
#[derive(Debug, Clone, PartialEq)]
pub struct BrepPoint {
    pub position: Point2,
    /// Regions whose boundary passes through the point, ascending.
    pub regions: Vec<RegionId>,
}

/// A straight boundary edge between two points (indices into `points`).
#[derive(Debug, Clone, PartialEq)]
pub struct BrepEdge {
    pub start: usize,
    pub end: usize,
    /// Regions bordering the edge, ascending.
    pub regions: Vec<RegionId>,
}

impl BrepEdge {
    /// An edge bordering two or more regions, which must survive meshing.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.regions.len() >= 2
    }
}

/// Index of an edge in a loop and its traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedEdge {
    pub edge: usize,
    pub reversed: bool,
}

/// One region's area: an outer loop followed by hole loops.
#[derive(Debug, Clone, PartialEq)]
pub struct BrepSurface {
    pub region: RegionId,
    pub loops: Vec<Vec<SignedEdge>>,
}

/// Deduplicated points, edges and surfaces describing the geometry to mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundaryRepresentation {
    pub points: Vec<BrepPoint>,
    pub edges: Vec<BrepEdge>,
    pub surfaces: Vec<BrepSurface>,
}

impl BoundaryRepresentation {
    /// Edges bordering at least two regions.
    pub fn interface_edges(&self) -> impl Iterator<Item = (usize, &BrepEdge)> {
        self.edges.iter().enumerate().filter(|(_, e)| e.is_interface())
    }

    /// Positions of a loop's vertices, in traversal order.
    #[must_use]
    pub fn loop_points(&self, edges: &[SignedEdge]) -> Vec<Point2> {
        edges
            .iter()
            .map(|se| {
                let e = &self.edges[se.edge];
                let start = if se.reversed { e.end } else { e.start };
                self.points[start].position
            })
            .collect()
    }

    /// Enclosed area of surface `index`: outer loop minus holes.
    #[must_use]
    pub fn surface_area(&self, index: usize) -> f64 {
        self.surfaces[index]
            .loops
            .iter()
            .enumerate()
            .map(|(i, l)| {
                let a = signed_area(&self.loop_points(l)).abs();
                if i == 0 {
                    a
                } else {
                    -a
                }
            })
            .sum()
    }

    /// Sum of all surface areas.
    #[must_use]
    pub fn total_area(&self) -> f64 {
        (0..self.surfaces.len()).map(|i| self.surface_area(i)).sum()
    }

    /// Even-odd containment of `p` in surface `index`.
    #[must_use]
    pub fn surface_contains(&self, index: usize, p: &Point2) -> bool {
        let mut loops = self.surfaces[index].loops.iter();
        let Some(outer) = loops.next() else {
            return false;
        };
        point_in_ring(p, &self.loop_points(outer)) && !loops.any(|h| point_in_ring(p, &self.loop_points(h)))
    }

    /// Checks that every loop is closed (each edge ends where the next starts)
    /// and every edge is used by at most two loop traversals.
    ///
    /// Returns a description of the first violation.
    #[must_use]
    pub fn check_watertight(&self) -> Option<String> {
        let mut uses = vec![0usize; self.edges.len()];
        for (si, surface) in self.surfaces.iter().enumerate() {
            for (li, l) in surface.loops.iter().enumerate() {
                for (k, se) in l.iter().enumerate() {
                    uses[se.edge] += 1;
                    let next = l[(k + 1) % l.len()];
                    if self.head(*se) != self.tail(next) {
                        return Some(format!("surface {si} loop {li} is open at edge {}", se.edge));
                    }
                }
            }
        }
        uses.iter()
            .position(|&u| u > 2)
            .map(|e| format!("edge {e} is used by more than two loops"))
    }

    fn tail(&self, se: SignedEdge) -> usize {
        let e = &self.edges[se.edge];
        if se.reversed {
            e.end
        } else {
            e.start
        }
    }

    fn head(&self, se: SignedEdge) -> usize {
        let e = &self.edges[se.edge];
        if se.reversed {
            e.start
        } else {
            e.end
        }
    }
}
