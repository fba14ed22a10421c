use super::brep::BoundaryRepresentation;
use super::params::MeshQuality;
use crate::error::BackendError;
use crate::math::Point2;

/// A discretized cross-section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point2>,
    /// Counter-clockwise vertex index triples.
    pub triangles: Vec<[u32; 3]>,
    /// Index into the brep's surfaces for each triangle.
    pub triangle_surfaces: Vec<usize>,
    /// Mesh segments lying on brep edges, with the brep edge index.
    pub boundary_segments: Vec<([u32; 2], usize)>,
}

impl Mesh {
    /// Area of triangle `index`.
    #[must_use]
    pub fn triangle_area(&self, index: usize) -> f64 {
        let [a, b, c] = self.triangles[index].map(|i| self.vertices[i as usize]);
        0.5 * ((b - a).x * (c - a).y - (b - a).y * (c - a).x)
    }

    /// Total area of the triangles assigned to surface `surface`.
    #[must_use]
    pub fn surface_area(&self, surface: usize) -> f64 {
        self.triangle_surfaces
            .iter()
            .enumerate()
            .filter(|(_, &s)| s == surface)
            .map(|(i, _)| self.triangle_area(i))
            .sum()
    }

    /// Checks that every index of the mesh points into its own vertices or
    /// into `brep`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Malformed`] naming the first bad index.
    pub fn validate(&self, brep: &BoundaryRepresentation) -> Result<(), BackendError> {
        if self.triangle_surfaces.len() != self.triangles.len() {
            return Err(BackendError::Malformed(format!(
                "{} triangles but {} surface tags",
                self.triangles.len(),
                self.triangle_surfaces.len()
            )));
        }
        let vertices = self.vertices.len();
        let vertex_ok = |i: &u32| (*i as usize) < vertices;
        if let Some(t) = self.triangles.iter().position(|t| !t.iter().all(vertex_ok)) {
            return Err(BackendError::Malformed(format!("triangle {t} has a vertex out of range")));
        }
        if let Some(s) = self.triangle_surfaces.iter().find(|&&s| s >= brep.surfaces.len()) {
            return Err(BackendError::Malformed(format!("unknown surface {s}")));
        }
        for (segment, edge) in &self.boundary_segments {
            if !segment.iter().all(vertex_ok) || *edge >= brep.edges.len() {
                return Err(BackendError::Malformed(format!(
                    "boundary segment {segment:?} on edge {edge} is out of range"
                )));
            }
        }
        Ok(())
    }

    /// Multiplies every vertex coordinate by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.vertices {
            v.coords *= factor;
        }
    }
}

/// A meshing engine behind the boundary-representation contract.
///
/// Implementations may be shared by concurrent builds.
pub trait MeshBackend: Send + Sync {
    /// Meshes `brep`.
    ///
    /// `surface_sizes` holds an optional element size per brep surface that
    /// overrides `quality.target_element_size` inside that surface.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] if the boundary representation is rejected.
    fn mesh(
        &self,
        brep: &BoundaryRepresentation,
        quality: &MeshQuality,
        surface_sizes: &[Option<f64>],
    ) -> Result<Mesh, BackendError>;
}
