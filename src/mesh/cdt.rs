use std::collections::HashMap;

use spade::handles::FixedVertexHandle;
use spade::{
    AngleLimit, ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2,
    RefinementParameters, Triangulation,
};

use super::backend::{Mesh, MeshBackend};
use super::brep::BoundaryRepresentation;
use super::params::MeshQuality;
use crate::error::BackendError;
use crate::math::polygon_2d::point_in_ring;
use crate::math::{Point2, Rect};

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Default cap on the number of mesh vertices.
pub const DEFAULT_MAX_VERTICES: usize = 250_000;

/// Best minimum angle, in degrees, the refinement can promise.
const MAX_ANGLE_LIMIT_DEG: f64 = 30.0;

/// Constrained Delaunay meshing backend built on `spade`.
///
/// Every brep edge becomes a constraint edge and is never split, so boundary
/// resolution is controlled by the builder's boundary subdivision.
#[derive(Debug, Clone, Copy)]
pub struct CdtBackend {
    max_vertices: usize,
}

impl Default for CdtBackend {
    fn default() -> Self {
        Self {
            max_vertices: DEFAULT_MAX_VERTICES,
        }
    }
}

impl CdtBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of vertices refinement may create.
    #[must_use]
    pub fn with_max_vertices(mut self, max_vertices: usize) -> Self {
        self.max_vertices = max_vertices;
        self
    }
}

impl MeshBackend for CdtBackend {
    #[allow(clippy::cast_possible_truncation)]
    fn mesh(
        &self,
        brep: &BoundaryRepresentation,
        quality: &MeshQuality,
        surface_sizes: &[Option<f64>],
    ) -> Result<Mesh, BackendError> {
        if brep.surfaces.is_empty() {
            return Err(BackendError::Empty);
        }
        let locator = SurfaceLocator::new(brep);

        let mut cdt = Cdt::new();
        let mut handles = Vec::with_capacity(brep.points.len());
        for p in &brep.points {
            handles.push(insert(&mut cdt, p.position)?);
        }

        let mut edge_of: HashMap<(usize, usize), usize> = HashMap::with_capacity(brep.edges.len());
        for (i, e) in brep.edges.iter().enumerate() {
            let (a, b) = (handles[e.start], handles[e.end]);
            if a == b {
                return Err(BackendError::Rejected(format!("edge {i} collapses to a point")));
            }
            if !cdt.can_add_constraint(a, b) {
                return Err(BackendError::Rejected(format!(
                    "edge {i} crosses another boundary edge"
                )));
            }
            cdt.add_constraint(a, b);
            edge_of.insert(vertex_pair(a, b), i);
        }

        // Global pass: angle quality and the coarsest requested size.
        let coarsest = surface_sizes
            .iter()
            .flatten()
            .copied()
            .fold(quality.target_element_size, f64::max);
        let angle = MAX_ANGLE_LIMIT_DEG * quality.min_element_quality.clamp(0.0, 1.0);
        let refinement = RefinementParameters::<f64>::new()
            .keep_constraint_edges()
            .with_angle_limit(AngleLimit::from_deg(angle))
            .with_max_allowed_area(equilateral_area(coarsest))
            .with_max_additional_vertices(self.max_vertices.saturating_sub(cdt.num_vertices()));
        let result = cdt.refine(refinement);
        if !result.refinement_complete {
            tracing::warn!(
                vertices = cdt.num_vertices(),
                "quality refinement stopped at the vertex limit"
            );
        }

        // Local pass: per-surface sizes and boundary-driven sizes.
        let local_size = if quality.curvature_refinement {
            boundary_local_sizes(brep, &handles)
        } else {
            HashMap::new()
        };
        self.refine_sizes(&mut cdt, &locator, quality, surface_sizes, &local_size)?;

        let mut mesh = Mesh::default();
        let mut vertex_map: HashMap<FixedVertexHandle, u32> = HashMap::new();
        for face in cdt.inner_faces() {
            let verts = face.vertices();
            let positions = verts.map(|v| to_point(v.position()));
            let Some(surface) = locator.locate(&centroid(&positions)) else {
                continue;
            };
            let mut tri = [0u32; 3];
            for (slot, vh) in tri.iter_mut().zip(verts) {
                *slot = *vertex_map.entry(vh.fix()).or_insert_with(|| {
                    mesh.vertices.push(to_point(vh.position()));
                    (mesh.vertices.len() - 1) as u32
                });
            }
            mesh.triangles.push(tri);
            mesh.triangle_surfaces.push(surface);
        }

        for edge in cdt.undirected_edges() {
            if !cdt.is_constraint_edge(edge.fix()) {
                continue;
            }
            let [a, b] = edge.vertices();
            let Some(&brep_edge) = edge_of.get(&vertex_pair(a.fix(), b.fix())) else {
                continue;
            };
            if let (Some(&ia), Some(&ib)) = (vertex_map.get(&a.fix()), vertex_map.get(&b.fix())) {
                mesh.boundary_segments.push(([ia, ib], brep_edge));
            }
        }
        mesh.boundary_segments.sort_by_key(|&(_, e)| e);

        tracing::debug!(
            vertices = mesh.vertices.len(),
            triangles = mesh.triangles.len(),
            "cdt mesh complete"
        );
        Ok(mesh)
    }
}

impl CdtBackend {
    /// Splits triangles larger than their local size limit by inserting their
    /// centroids until every triangle fits or the vertex cap is reached.
    fn refine_sizes(
        &self,
        cdt: &mut Cdt,
        locator: &SurfaceLocator,
        quality: &MeshQuality,
        surface_sizes: &[Option<f64>],
        local_size: &HashMap<FixedVertexHandle, f64>,
    ) -> Result<(), BackendError> {
        loop {
            let mut pending = Vec::new();
            for face in cdt.inner_faces() {
                let verts = face.vertices();
                let positions = verts.map(|v| to_point(v.position()));
                let c = centroid(&positions);
                let Some(surface) = locator.locate(&c) else {
                    continue;
                };
                let mut limit = surface_sizes
                    .get(surface)
                    .copied()
                    .flatten()
                    .unwrap_or(quality.target_element_size);
                for vh in verts {
                    if let Some(&s) = local_size.get(&vh.fix()) {
                        limit = limit.min(s);
                    }
                }
                if triangle_area(&positions) > equilateral_area(limit) {
                    pending.push(c);
                }
            }
            if pending.is_empty() {
                return Ok(());
            }
            if cdt.num_vertices() + pending.len() > self.max_vertices {
                tracing::warn!(
                    vertices = cdt.num_vertices(),
                    pending = pending.len(),
                    "size refinement stopped at the vertex limit"
                );
                return Ok(());
            }
            for c in pending {
                insert(cdt, c)?;
            }
        }
    }
}

/// Finds the brep surface containing a point.
struct SurfaceLocator {
    surfaces: Vec<(Rect, Vec<Vec<Point2>>)>,
}

impl SurfaceLocator {
    fn new(brep: &BoundaryRepresentation) -> Self {
        let surfaces = brep
            .surfaces
            .iter()
            .map(|s| {
                let loops: Vec<Vec<Point2>> = s.loops.iter().map(|l| brep.loop_points(l)).collect();
                let rect = loops
                    .first()
                    .and_then(|outer| Rect::bounding(outer))
                    .unwrap_or(Rect::new(Point2::origin(), Point2::origin()));
                (rect, loops)
            })
            .collect();
        Self { surfaces }
    }

    fn locate(&self, p: &Point2) -> Option<usize> {
        let query = Rect::new(*p, *p);
        self.surfaces.iter().position(|(rect, loops)| {
            rect.intersects(&query)
                && loops.first().is_some_and(|outer| point_in_ring(p, outer))
                && !loops[1..].iter().any(|h| point_in_ring(p, h))
        })
    }
}

/// Shortest brep edge incident to each boundary vertex.
fn boundary_local_sizes(
    brep: &BoundaryRepresentation,
    handles: &[FixedVertexHandle],
) -> HashMap<FixedVertexHandle, f64> {
    let mut sizes: HashMap<FixedVertexHandle, f64> = HashMap::new();
    for e in &brep.edges {
        let len = (brep.points[e.end].position - brep.points[e.start].position).norm();
        for end in [e.start, e.end] {
            let entry = sizes.entry(handles[end]).or_insert(len);
            *entry = entry.min(len);
        }
    }
    sizes
}

fn insert(cdt: &mut Cdt, p: Point2) -> Result<FixedVertexHandle, BackendError> {
    cdt.insert(SpadePoint2::new(p.x, p.y))
        .map_err(|e: InsertionError| BackendError::Insertion(format!("({}, {}): {e}", p.x, p.y)))
}

fn vertex_pair(a: FixedVertexHandle, b: FixedVertexHandle) -> (usize, usize) {
    let (a, b) = (a.index(), b.index());
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn to_point(p: SpadePoint2<f64>) -> Point2 {
    Point2::new(p.x, p.y)
}

fn centroid(p: &[Point2; 3]) -> Point2 {
    Point2::new((p[0].x + p[1].x + p[2].x) / 3.0, (p[0].y + p[1].y + p[2].y) / 3.0)
}

fn triangle_area(p: &[Point2; 3]) -> f64 {
    let (ab, ac) = (p[1] - p[0], p[2] - p[0]);
    0.5 * (ab.x * ac.y - ab.y * ac.x).abs()
}

/// Area of an equilateral triangle with edge length `h`.
fn equilateral_area(h: f64) -> f64 {
    0.25 * 3.0_f64.sqrt() * h * h
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Normalizer;
    use crate::topology::{RegionId, TopologyTracker};
    use approx::assert_relative_eq;

    fn two_squares() -> BoundaryRepresentation {
        let mut t = TopologyTracker::new(Normalizer::new(1e-3).unwrap());
        for (i, x) in [0.0, 1.0].into_iter().enumerate() {
            let ring = [
                Point2::new(x, 0.0),
                Point2::new(x + 1.0, 0.0),
                Point2::new(x + 1.0, 1.0),
                Point2::new(x, 1.0),
            ];
            let edges = t.register_ring(&ring, RegionId(i)).unwrap();
            t.register_surface(RegionId(i), vec![edges]).unwrap();
        }
        t.finalize().unwrap()
    }

    fn quality(size: f64) -> MeshQuality {
        MeshQuality {
            target_element_size: size,
            ..MeshQuality::default()
        }
    }

    #[test]
    fn meshes_cover_each_surface() {
        let brep = two_squares();
        let mesh = CdtBackend::new().mesh(&brep, &quality(0.3), &[None, None]).unwrap();
        assert_relative_eq!(mesh.surface_area(0), 1.0, epsilon = 1e-9);
        assert_relative_eq!(mesh.surface_area(1), 1.0, epsilon = 1e-9);
        assert_eq!(mesh.triangles.len(), mesh.triangle_surfaces.len());
        for i in 0..mesh.triangles.len() {
            assert!(mesh.triangle_area(i) > 0.0, "triangles must be counter-clockwise");
        }
    }

    #[test]
    fn surface_size_override_refines_locally() {
        let brep = two_squares();
        let coarse = CdtBackend::new().mesh(&brep, &quality(1.0), &[None, None]).unwrap();
        let fine = CdtBackend::new().mesh(&brep, &quality(1.0), &[Some(0.1), None]).unwrap();
        let count = |m: &Mesh, s: usize| m.triangle_surfaces.iter().filter(|&&t| t == s).count();
        assert!(count(&fine, 0) > count(&coarse, 0));
        let max_area = (0..fine.triangles.len())
            .filter(|&i| fine.triangle_surfaces[i] == 0)
            .map(|i| fine.triangle_area(i))
            .fold(0.0, f64::max);
        assert!(max_area <= equilateral_area(0.1) + 1e-12);
    }

    #[test]
    fn interface_edge_appears_as_boundary_segment() {
        let brep = two_squares();
        let mesh = CdtBackend::new().mesh(&brep, &quality(0.5), &[None, None]).unwrap();
        let (interface, _) = brep.interface_edges().next().unwrap();
        assert_eq!(mesh.boundary_segments.iter().filter(|(_, e)| *e == interface).count(), 1);
        assert_eq!(mesh.boundary_segments.len(), brep.edges.len());
    }

    #[test]
    fn empty_brep_rejected() {
        let err = CdtBackend::new()
            .mesh(&BoundaryRepresentation::default(), &quality(1.0), &[])
            .unwrap_err();
        assert_eq!(err, BackendError::Empty);
    }

    #[test]
    fn crossing_edges_rejected() {
        let mut t = TopologyTracker::new(Normalizer::new(1e-3).unwrap());
        let bowtie = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ];
        let edges = t.register_ring(&bowtie, RegionId(0)).unwrap();
        t.register_surface(RegionId(0), vec![edges]).unwrap();
        let brep = t.finalize().unwrap();
        let err = CdtBackend::new().mesh(&brep, &quality(1.0), &[None]).unwrap_err();
        assert!(matches!(err, BackendError::Rejected(_)));
    }
}
