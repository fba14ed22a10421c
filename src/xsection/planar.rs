use rayon::prelude::*;

use super::{build, normalizer, tagged_polygons};
use crate::error::Result;
use crate::layout::{CrossSection, LayoutSource};
use crate::math::Rect;
use crate::mesh::{CdtBackend, CrossSectionMesh, MeshBackend, MeshParameters};
use crate::stack::LayerStack;

/// Horizontal slice of the layout at height `z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XyCrossSection {
    z: f64,
    bounds: Option<Rect>,
}

impl XyCrossSection {
    #[must_use]
    pub fn new(z: f64) -> Self {
        Self { z, bounds: None }
    }

    /// Restricts the slice to a window of the layout.
    #[must_use]
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    #[must_use]
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Meshes the slice.
    ///
    /// Only layers present at `z` take part. Ranges are half-open and compared
    /// at the build resolution.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid parameters, an unresolvable overlap of
    /// layers, or a backend failure (including an empty slice).
    pub fn execute(
        &self,
        layout: &dyn LayoutSource,
        stack: &LayerStack,
        params: &MeshParameters,
        backend: &dyn MeshBackend,
    ) -> Result<CrossSectionMesh> {
        let _span = tracing::info_span!("xy_cross_section", z = self.z).entered();
        let cross_section = CrossSection::Planar {
            z: self.z,
            bounds: self.bounds,
        };
        let normalizer = normalizer(params)?;
        let entries = stack.entries_at(self.z, &normalizer);
        let polygons = tagged_polygons(layout, entries, &cross_section, normalizer);
        build(polygons, stack, params, &normalizer, backend)
    }
}

/// Meshes the x-y slice at `z` with the default backend.
///
/// # Errors
///
/// See [`XyCrossSection::execute`].
pub fn planar_mesh(
    layout: &dyn LayoutSource,
    stack: &LayerStack,
    z: f64,
    params: &MeshParameters,
) -> Result<CrossSectionMesh> {
    planar_mesh_with(layout, stack, z, params, &CdtBackend::default())
}

/// Meshes the x-y slice at `z` with `backend`.
///
/// # Errors
///
/// See [`XyCrossSection::execute`].
pub fn planar_mesh_with(
    layout: &dyn LayoutSource,
    stack: &LayerStack,
    z: f64,
    params: &MeshParameters,
    backend: &dyn MeshBackend,
) -> Result<CrossSectionMesh> {
    XyCrossSection::new(z).execute(layout, stack, params, backend)
}

/// Meshes several x-y slices in parallel, one independent build per height.
///
/// # Errors
///
/// Returns the first error encountered by any build.
pub fn planar_meshes(
    layout: &dyn LayoutSource,
    stack: &LayerStack,
    zs: &[f64],
    params: &MeshParameters,
) -> Result<Vec<CrossSectionMesh>> {
    let backend = CdtBackend::default();
    zs.par_iter()
        .map(|&z| planar_mesh_with(layout, stack, z, params, &backend))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::XsmeshError;
    use crate::geometry::Polygon;
    use crate::layout::LayoutDb;
    use crate::math::Point2;
    use crate::stack::LayerStackEntry;
    use approx::assert_relative_eq;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::rectangle(&Rect::new(Point2::new(x0, y0), Point2::new(x1, y1)))
    }

    fn layout() -> LayoutDb {
        LayoutDb::new()
            .with("core", rect(-0.25, -2.0, 0.25, 2.0))
            .with("clad", rect(-2.0, -2.0, 2.0, 2.0))
            .with("box", rect(-2.0, -2.0, 2.0, 2.0))
    }

    fn stack(prioritized: bool) -> LayerStack {
        let core = LayerStackEntry::new("core", "si", 0.0, 0.22).unwrap();
        let clad = LayerStackEntry::new("clad", "sio2_top", 0.0, 1.0).unwrap();
        let (core, clad) = if prioritized {
            (core.with_mesh_order(1), clad.with_mesh_order(2))
        } else {
            (core, clad)
        };
        LayerStack::new(vec![
            LayerStackEntry::new("box", "sio2", -1.0, 0.0).unwrap(),
            core,
            clad,
        ])
        .unwrap()
    }

    fn params() -> MeshParameters {
        MeshParameters {
            resolution: 1e-3,
            ..MeshParameters::default()
        }
    }

    #[test]
    fn core_slice_resolves_priority() {
        let mesh = planar_mesh(&layout(), &stack(true), 0.1, &params()).unwrap();
        assert_eq!(mesh.regions.len(), 2);
        assert_relative_eq!(mesh.material_area("si"), 2.0, epsilon = 1e-9);
        assert_relative_eq!(mesh.material_area("sio2_top"), 14.0, epsilon = 1e-9);
        assert!(mesh.warnings.is_empty());
    }

    #[test]
    fn box_slice_has_single_region() {
        let mesh = planar_mesh(&layout(), &stack(true), -0.5, &params()).unwrap();
        assert_eq!(mesh.regions.len(), 1);
        assert_eq!(mesh.regions[0].label, "box");
        assert_relative_eq!(mesh.material_area("sio2"), 16.0, epsilon = 1e-9);
    }

    #[test]
    fn ambiguity_reports_vertical_overlap() {
        let err = planar_mesh(&layout(), &stack(false), 0.1, &params()).unwrap_err();
        let XsmeshError::StackAmbiguity(err) = err else {
            panic!("expected an ambiguity error, got {err}");
        };
        assert_eq!((err.layer_a.as_str(), err.layer_b.as_str()), ("clad", "core"));
        let interval = err.interval.unwrap();
        assert_relative_eq!(interval.lo(), 0.0);
        assert_relative_eq!(interval.hi(), 0.22);
    }

    #[test]
    fn slice_outside_stack_is_empty() {
        let err = planar_mesh(&layout(), &stack(true), 5.0, &params()).unwrap_err();
        assert!(matches!(err, XsmeshError::Backend(_)));
    }

    #[test]
    fn bounds_clip_the_slice() {
        let window = Rect::new(Point2::new(0.0, -1.0), Point2::new(1.0, 1.0));
        let mesh = XyCrossSection::new(0.1)
            .with_bounds(window)
            .execute(&layout(), &stack(true), &params(), &CdtBackend::default())
            .unwrap();
        assert_relative_eq!(mesh.material_area("si"), 0.5, epsilon = 1e-9);
        assert_relative_eq!(mesh.material_area("sio2_top"), 1.5, epsilon = 1e-9);
    }

    #[test]
    fn layer_ending_within_resolution_is_absent() {
        let stack = LayerStack::new(vec![
            LayerStackEntry::new("box", "sio2", -1.0, 0.000_1).unwrap(),
            LayerStackEntry::new("core", "si", 0.0, 0.22).unwrap(),
        ])
        .unwrap();
        let mesh = planar_mesh(&layout(), &stack, 0.000_05, &params()).unwrap();
        assert_eq!(mesh.regions.len(), 1);
        assert_relative_eq!(mesh.material_area("si"), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn parallel_slices_match_sequential() {
        let (db, st, p) = (layout(), stack(true), params());
        let meshes = planar_meshes(&db, &st, &[-0.5, 0.1], &p).unwrap();
        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[1], planar_mesh(&db, &st, 0.1, &p).unwrap());
    }
}
