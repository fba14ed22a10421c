//! End-to-end cross-section meshing: layer selection, extraction and build.

mod planar;
mod swept;

pub use planar::{planar_mesh, planar_mesh_with, planar_meshes, XyCrossSection};
pub use swept::{swept_mesh, swept_mesh_with, UzCrossSection};

use crate::error::{Result, XsmeshError};
use crate::geometry::TaggedPolygon;
use crate::layout::{CrossSection, LayoutExtractor, LayoutSource};
use crate::math::Normalizer;
use crate::mesh::{CrossSectionMesh, MeshBackend, MeshFromPolygons, MeshParameters};
use crate::stack::{LayerStack, LayerStackEntry};

/// Validates `params` and returns the normalizer every step of a slice shares.
fn normalizer(params: &MeshParameters) -> Result<Normalizer> {
    params.validate()?;
    Ok(Normalizer::new(params.resolution)?)
}

/// Extracts every entry's polygons and tags them with the entry's label.
fn tagged_polygons<'s>(
    layout: &dyn LayoutSource,
    entries: impl IntoIterator<Item = &'s LayerStackEntry>,
    cross_section: &CrossSection,
    normalizer: Normalizer,
) -> Vec<TaggedPolygon> {
    let extractor = LayoutExtractor::new(layout, normalizer);
    let mut out = Vec::new();
    for entry in entries {
        let tag = entry.tag();
        let polygons = extractor.extract(entry, cross_section);
        tracing::debug!(layer = %entry.layer(), polygons = polygons.len(), "extracted layer");
        out.extend(polygons.into_iter().map(|p| TaggedPolygon::new(tag.clone(), p)));
    }
    out
}

/// Runs the build and completes ambiguity errors with the vertical overlap of
/// the offending pair.
fn build(
    polygons: Vec<TaggedPolygon>,
    stack: &LayerStack,
    params: &MeshParameters,
    normalizer: &Normalizer,
    backend: &dyn MeshBackend,
) -> Result<CrossSectionMesh> {
    MeshFromPolygons::new(polygons, params.clone())
        .execute(backend)
        .map_err(|err| match err {
            XsmeshError::StackAmbiguity(mut ambiguity) => {
                if ambiguity.interval.is_none() {
                    ambiguity.interval =
                        stack.overlap(&ambiguity.layer_a, &ambiguity.layer_b, normalizer);
                }
                ambiguity.into()
            }
            other => other,
        })
}
