use super::{build, normalizer, tagged_polygons};
use crate::error::Result;
use crate::geometry::Path;
use crate::layout::{CrossSection, LayoutSource};
use crate::mesh::{CdtBackend, CrossSectionMesh, MeshBackend, MeshParameters};
use crate::stack::{LayerStack, ZInterval};

/// Vertical slice along a path: `u` is arc length along the path, the second
/// coordinate is `z`.
#[derive(Debug, Clone, PartialEq)]
pub struct UzCrossSection {
    path: Path,
    z_range: Option<ZInterval>,
}

impl UzCrossSection {
    #[must_use]
    pub fn new(path: Path) -> Self {
        Self {
            path,
            z_range: None,
        }
    }

    /// Keeps only the part of the stack inside `z_range`.
    #[must_use]
    pub fn with_z_range(mut self, z_range: ZInterval) -> Self {
        self.z_range = Some(z_range);
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Meshes the slice using every layer of the stack.
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
        let _span = tracing::info_span!("uz_cross_section", length = self.path.length()).entered();
        let cross_section = CrossSection::Swept {
            path: self.path.clone(),
            z_range: self.z_range,
        };
        let normalizer = normalizer(params)?;
        let polygons = tagged_polygons(layout, stack.ordered(), &cross_section, normalizer);
        build(polygons, stack, params, &normalizer, backend)
    }
}

/// Meshes the u-z slice along `path` with the default backend.
///
/// # Errors
///
/// See [`UzCrossSection::execute`].
pub fn swept_mesh(
    layout: &dyn LayoutSource,
    stack: &LayerStack,
    path: &Path,
    params: &MeshParameters,
) -> Result<CrossSectionMesh> {
    swept_mesh_with(layout, stack, path, params, &CdtBackend::default())
}

/// Meshes the u-z slice along `path` with `backend`.
///
/// # Errors
///
/// See [`UzCrossSection::execute`].
pub fn swept_mesh_with(
    layout: &dyn LayoutSource,
    stack: &LayerStack,
    path: &Path,
    params: &MeshParameters,
    backend: &dyn MeshBackend,
) -> Result<CrossSectionMesh> {
    UzCrossSection::new(path.clone()).execute(layout, stack, params, backend)
}
