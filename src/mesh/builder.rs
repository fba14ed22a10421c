//! Polygon-to-mesh build: normalization, fusion, tiling, topology tracking
//! and the backend call.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::f64::consts::FRAC_1_SQRT_2;

use super::backend::{Mesh, MeshBackend};
use super::brep::BoundaryRepresentation;
use super::params::MeshParameters;
use crate::error::{BackendError, GeometryError, Result, StackAmbiguityError, TopologyError};
use crate::geometry::{LayerTag, Polygon, TaggedPolygon};
use crate::layout::{fuse, subdivide, tile};
use crate::math::polygon_2d::point_segment_distance;
use crate::math::{GridKey, Normalizer, Point2, Rect};
use crate::stack::LayerId;
use crate::topology::{RegionId, TopologyTracker};

/// One material-tagged region of a build.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionInfo {
    pub id: RegionId,
    /// Covering layer names joined with `+`.
    pub label: String,
    pub material: String,
    /// Covering layers, sorted.
    pub layers: Vec<LayerId>,
    pub element_size: Option<f64>,
}

/// Boundary representation ready for a backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedGeometry {
    pub brep: BoundaryRepresentation,
    /// Indexed by [`RegionId`].
    pub regions: Vec<RegionInfo>,
    /// Polygons excluded from the build.
    pub warnings: Vec<GeometryError>,
}

impl PreparedGeometry {
    /// Element size override of each brep surface, from its region.
    #[must_use]
    pub fn surface_sizes(&self) -> Vec<Option<f64>> {
        self.brep
            .surfaces
            .iter()
            .map(|s| self.regions.get(s.region.0).and_then(|r| r.element_size))
            .collect()
    }

    /// Total brep area of `region`.
    #[must_use]
    pub fn region_area(&self, region: RegionId) -> f64 {
        (0..self.brep.surfaces.len())
            .filter(|&i| self.brep.surfaces[i].region == region)
            .map(|i| self.brep.surface_area(i))
            .sum()
    }
}

/// A meshed cross-section with its region table.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSectionMesh {
    pub mesh: Mesh,
    /// Region of each triangle.
    pub triangle_regions: Vec<RegionId>,
    pub regions: Vec<RegionInfo>,
    pub warnings: Vec<GeometryError>,
}

impl CrossSectionMesh {
    /// Looks up a region by its label.
    #[must_use]
    pub fn region_by_label(&self, label: &str) -> Option<&RegionInfo> {
        self.regions.iter().find(|r| r.label == label)
    }

    /// Meshed area of `region`.
    #[must_use]
    pub fn region_area(&self, region: RegionId) -> f64 {
        self.triangle_regions
            .iter()
            .enumerate()
            .filter(|(_, &r)| r == region)
            .map(|(i, _)| self.mesh.triangle_area(i))
            .sum()
    }

    /// Meshed area of every region made of `material`.
    #[must_use]
    pub fn material_area(&self, material: &str) -> f64 {
        self.regions
            .iter()
            .filter(|r| r.material == material)
            .map(|r| self.region_area(r.id))
            .sum()
    }
}

/// Builds a conformal cross-section mesh from layer-tagged polygons.
pub struct MeshFromPolygons {
    polygons: Vec<TaggedPolygon>,
    params: MeshParameters,
}

impl MeshFromPolygons {
    /// Creates a new `MeshFromPolygons` operation.
    #[must_use]
    pub fn new(polygons: Vec<TaggedPolygon>, params: MeshParameters) -> Self {
        Self { polygons, params }
    }

    #[must_use]
    pub fn params(&self) -> &MeshParameters {
        &self.params
    }

    /// Prepares the boundary representation without meshing.
    ///
    /// # Errors
    ///
    /// Returns a config error for invalid parameters, a
    /// [`StackAmbiguityError`] when differently-made layers overlap without a
    /// deciding `mesh_order`, or a topology error if the emitted boundary is
    /// not watertight.
    pub fn boundary(&self) -> Result<PreparedGeometry> {
        self.params.validate()?;
        let normalizer = Normalizer::new(self.params.resolution)?;
        let _span = tracing::info_span!("mesh_from_polygons", polygons = self.polygons.len()).entered();

        let (layers, warnings) = self.normalized_layers(&normalizer);
        let mut fused: Vec<(LayerTag, Vec<Polygon>)> = layers
            .into_values()
            .map(|(tag, polygons)| (tag, fuse(&polygons, &normalizer)))
            .filter(|(_, polygons)| !polygons.is_empty())
            .collect();
        tracing::debug!(layers = fused.len(), "fused layers");

        let background = self.params.background.as_ref().map(|bg| bg.layer.clone());
        if let Some(bg) = &self.params.background {
            let bounds = fused
                .iter()
                .flat_map(|(_, polygons)| polygons.iter().map(Polygon::bounding_rect))
                .reduce(|a, b| a.union(&b));
            if let Some(bounds) = bounds {
                let [left, bottom, right, top] = bg.padding;
                let padded = Rect::new(
                    Point2::new(bounds.min.x - left, bounds.min.y - bottom),
                    Point2::new(bounds.max.x + right, bounds.max.y + top),
                );
                let rect = normalizer.normalize_polygon(&Polygon::rectangle(&padded))?;
                fused.push((LayerTag::new(bg.layer.clone(), bg.material.clone()), vec![rect]));
            }
        }

        // Tiles with the same resolved layer set form one region.
        let mut merged: BTreeMap<Vec<LayerId>, (String, Vec<Polygon>)> = BTreeMap::new();
        for t in tile(&fused, &normalizer) {
            let (layers, material) = resolve(&t.tags, background.as_ref())?;
            merged.entry(layers).or_insert_with(|| (material, Vec::new())).1.push(t.polygon);
        }

        let mut regions = Vec::with_capacity(merged.len());
        let mut surfaces: Vec<SurfaceRings> = Vec::new();
        for (index, (layers, (material, pieces))) in merged.into_iter().enumerate() {
            let id = RegionId(index);
            let max_segment = self.params.boundary_segment_for(&layers);
            for polygon in fuse(&pieces, &normalizer) {
                surfaces.push(SurfaceRings {
                    region: id,
                    max_segment,
                    rings: polygon.rings().map(|r| normalizer.normalize_ring(r)).collect(),
                });
            }
            regions.push(RegionInfo {
                id,
                label: layers.iter().map(LayerId::as_str).collect::<Vec<_>>().join("+"),
                material,
                element_size: self.params.element_size_for(&layers),
                layers,
            });
        }

        conform(&mut surfaces, &normalizer);
        subdivide_edges(&mut surfaces, &normalizer);

        let mut tracker = TopologyTracker::new(normalizer);
        for surface in &surfaces {
            let loops = surface
                .rings
                .iter()
                .map(|ring| tracker.register_ring(ring, surface.region))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            tracker.register_surface(surface.region, loops)?;
        }
        tracing::debug!(
            regions = regions.len(),
            points = tracker.point_count(),
            edges = tracker.edge_count(),
            interfaces = tracker.interface_edges().count(),
            "registered topology"
        );
        let brep = tracker.finalize()?;
        if let Some(reason) = brep.check_watertight() {
            return Err(TopologyError::OpenBoundary(reason).into());
        }

        Ok(PreparedGeometry {
            brep,
            regions,
            warnings,
        })
    }

    /// Prepares the geometry and meshes it with `backend`.
    ///
    /// # Errors
    ///
    /// Fails like [`boundary`](Self::boundary), or with the backend's error,
    /// including [`BackendError::Malformed`] for out-of-range output.
    pub fn execute(&self, backend: &dyn MeshBackend) -> Result<CrossSectionMesh> {
        let prepared = self.boundary()?;
        let mut mesh = backend.mesh(&prepared.brep, &self.params.quality, &prepared.surface_sizes())?;
        mesh.validate(&prepared.brep)?;
        mesh.scale(self.params.scaling);
        let triangle_regions = mesh
            .triangle_surfaces
            .iter()
            .map(|&s| {
                prepared
                    .brep
                    .surfaces
                    .get(s)
                    .map(|surface| surface.region)
                    .ok_or_else(|| BackendError::Malformed(format!("unknown surface {s}")))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(CrossSectionMesh {
            mesh,
            triangle_regions,
            regions: prepared.regions,
            warnings: prepared.warnings,
        })
    }

    /// Normalizes every input polygon and groups the survivors by layer.
    #[allow(clippy::type_complexity)]
    fn normalized_layers(
        &self,
        normalizer: &Normalizer,
    ) -> (BTreeMap<LayerId, (LayerTag, Vec<Polygon>)>, Vec<GeometryError>) {
        let mut layers: BTreeMap<LayerId, (LayerTag, Vec<Polygon>)> = BTreeMap::new();
        let mut warnings = Vec::new();
        for (index, tagged) in self.polygons.iter().enumerate() {
            match normalizer.normalize_polygon(&tagged.polygon) {
                Ok(polygon) => layers
                    .entry(tagged.tag.layer.clone())
                    .or_insert_with(|| (tagged.tag.clone(), Vec::new()))
                    .1
                    .push(polygon),
                Err(reason) => {
                    let err = GeometryError::Excluded {
                        layer: tagged.tag.layer.clone(),
                        index,
                        reason: Box::new(reason),
                    };
                    tracing::warn!(%err, "excluding polygon");
                    warnings.push(err);
                }
            }
        }
        (layers, warnings)
    }
}

/// Resolves the layers and material of a tile.
///
/// The background only counts when nothing else covers the tile. Among the
/// rest, a single material wins outright; otherwise the layers with the lowest
/// declared `mesh_order` must agree on one.
fn resolve(
    tags: &[LayerTag],
    background: Option<&LayerId>,
) -> std::result::Result<(Vec<LayerId>, String), StackAmbiguityError> {
    let foreground: Vec<&LayerTag> = tags.iter().filter(|t| Some(&t.layer) != background).collect();
    let candidates = if foreground.is_empty() {
        tags.iter().collect()
    } else {
        foreground
    };

    let top: Vec<&LayerTag> = match candidates.iter().filter_map(|t| t.mesh_order).min() {
        Some(best) if !same_material(&candidates) => candidates
            .iter()
            .copied()
            .filter(|t| t.mesh_order == Some(best))
            .collect(),
        _ => candidates.clone(),
    };
    if !same_material(&top) {
        let mut sorted = top;
        sorted.sort_by(|a, b| a.layer.cmp(&b.layer));
        let first = sorted[0];
        let other = sorted.iter().find(|t| t.material != first.material).unwrap_or(&first);
        return Err(StackAmbiguityError {
            layer_a: first.layer.clone(),
            layer_b: other.layer.clone(),
            interval: None,
        });
    }

    let material = top[0].material.clone();
    let mut layers: Vec<LayerId> = candidates
        .iter()
        .filter(|t| t.material == material)
        .map(|t| t.layer.clone())
        .collect();
    layers.sort();
    layers.dedup();
    Ok((layers, material))
}

fn same_material(tags: &[&LayerTag]) -> bool {
    tags.windows(2).all(|w| w[0].material == w[1].material)
}

/// Rings of one brep surface on their way to the tracker.
struct SurfaceRings {
    region: RegionId,
    max_segment: Option<f64>,
    rings: Vec<Vec<Point2>>,
}

/// Inserts every surface vertex that lies on another ring's edge into that
/// edge, so that regions meeting along partial edges share their vertices.
///
/// Rings must be snapped. A vertex and an edge endpoint can each sit half a
/// cell diagonal off the exact geometry, which bounds the distance accepted
/// here.
fn conform(surfaces: &mut [SurfaceRings], normalizer: &Normalizer) {
    let mut seen: HashSet<GridKey> = HashSet::new();
    let mut vertices: Vec<Point2> = surfaces
        .iter()
        .flat_map(|s| s.rings.iter().flatten())
        .filter(|p| seen.insert(normalizer.key(p)))
        .copied()
        .collect();
    vertices.sort_by(|p, q| p.x.total_cmp(&q.x));
    let tolerance = normalizer.epsilon() * (FRAC_1_SQRT_2 + 0.5);
    let mut inserted = 0usize;

    for ring in surfaces.iter_mut().flat_map(|s| s.rings.iter_mut()) {
        let n = ring.len();
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            out.push(a);
            let span = Rect::new(a, b);
            let start = vertices.partition_point(|v| v.x < span.min.x - tolerance);
            let end = vertices.partition_point(|v| v.x <= span.max.x + tolerance);
            let (ka, kb) = (normalizer.key(&a), normalizer.key(&b));
            let mut on_edge: Vec<(f64, Point2)> = vertices[start..end]
                .iter()
                .filter(|v| v.y >= span.min.y - tolerance && v.y <= span.max.y + tolerance)
                .filter(|v| {
                    let k = normalizer.key(v);
                    k != ka && k != kb
                })
                .filter_map(|v| {
                    let (distance, t) = point_segment_distance(v, &a, &b);
                    (distance <= tolerance && t > 0.0 && t < 1.0).then_some((t, *v))
                })
                .collect();
            on_edge.sort_by(|x, y| x.0.total_cmp(&y.0));
            inserted += on_edge.len();
            out.extend(on_edge.into_iter().map(|(_, v)| v));
        }
        *ring = out;
    }
    if inserted > 0 {
        tracing::debug!(inserted, "inserted T-junction vertices");
    }
}

/// Splits long edges with the finest boundary segment limit of any surface
/// using them, then snaps the result.
///
/// Runs after [`conform`], when a shared stretch of boundary is the same
/// edge in every ring that uses it, so both sides get bit-identical points.
fn subdivide_edges(surfaces: &mut [SurfaceRings], normalizer: &Normalizer) {
    let edge_key = |a: &Point2, b: &Point2| {
        let (ka, kb) = (normalizer.key(a), normalizer.key(b));
        if ka <= kb {
            (ka, kb)
        } else {
            (kb, ka)
        }
    };
    let mut limits: HashMap<(GridKey, GridKey), f64> = HashMap::new();
    for surface in surfaces.iter() {
        let Some(limit) = surface.max_segment else {
            continue;
        };
        for ring in &surface.rings {
            for (i, a) in ring.iter().enumerate() {
                let b = &ring[(i + 1) % ring.len()];
                limits
                    .entry(edge_key(a, b))
                    .and_modify(|l| *l = l.min(limit))
                    .or_insert(limit);
            }
        }
    }
    if limits.is_empty() {
        return;
    }

    for ring in surfaces.iter_mut().flat_map(|s| s.rings.iter_mut()) {
        let n = ring.len();
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            out.push(a);
            if let Some(&limit) = limits.get(&edge_key(&a, &b)) {
                out.extend(subdivide(&a, &b, limit));
            }
        }
        *ring = normalizer.normalize_ring(&out);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::XsmeshError;
    use crate::mesh::cdt::CdtBackend;
    use crate::mesh::params::{Background, LayerResolution, MeshQuality};
    use approx::assert_relative_eq;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::rectangle(&Rect::new(Point2::new(x0, y0), Point2::new(x1, y1)))
    }

    fn tagged(layer: &str, material: &str, polygon: Polygon) -> TaggedPolygon {
        TaggedPolygon::new(LayerTag::new(layer, material), polygon)
    }

    fn params() -> MeshParameters {
        MeshParameters {
            resolution: 1e-3,
            ..MeshParameters::default()
        }
    }

    fn triangle(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Polygon {
        Polygon::new(
            [a, b, c].iter().map(|&(x, y)| Point2::new(x, y)).collect(),
            vec![],
        )
        .unwrap()
    }

    /// Two triangles split along the diagonal (0,0)-(7,3), with different
    /// boundary segment limits on either side.
    fn diagonal_split() -> MeshFromPolygons {
        let mut params = params();
        for (layer, limit) in [("a", 0.07), ("b", 0.3)] {
            params.resolutions.insert(
                layer.into(),
                LayerResolution {
                    boundary_segment: Some(limit),
                    ..LayerResolution::default()
                },
            );
        }
        MeshFromPolygons::new(
            vec![
                tagged("a", "si", triangle((0.0, 0.0), (7.0, 0.0), (7.0, 3.0))),
                tagged("b", "sio2", triangle((0.0, 0.0), (7.0, 3.0), (0.0, 3.0))),
            ],
            params,
        )
    }

    struct StrayBackend;

    impl MeshBackend for StrayBackend {
        fn mesh(
            &self,
            brep: &BoundaryRepresentation,
            _quality: &MeshQuality,
            _surface_sizes: &[Option<f64>],
        ) -> std::result::Result<Mesh, BackendError> {
            Ok(Mesh {
                vertices: vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)],
                triangles: vec![[0, 1, 2]],
                triangle_surfaces: vec![brep.surfaces.len()],
                boundary_segments: vec![],
            })
        }
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    #[test]
    fn shared_segment_registered_once() {
        let prepared = MeshFromPolygons::new(
            vec![
                tagged("a", "si", rect(0.0, 0.0, 1.0, 1.0)),
                tagged("b", "sio2", rect(1.0, 0.0, 2.0, 1.0)),
            ],
            params(),
        )
        .boundary()
        .unwrap();
        assert_eq!(prepared.regions.len(), 2);
        assert_eq!(prepared.brep.points.len(), 6);
        assert_eq!(prepared.brep.edges.len(), 7);
        assert_eq!(prepared.brep.interface_edges().count(), 1);
        assert!(prepared.brep.check_watertight().is_none());
    }

    #[test]
    fn priority_resolves_overlap_and_conserves_area() {
        let prepared = MeshFromPolygons::new(
            vec![
                TaggedPolygon::new(LayerTag::new("core", "si").with_mesh_order(1), rect(0.0, 0.0, 2.0, 1.0)),
                TaggedPolygon::new(LayerTag::new("clad", "sio2").with_mesh_order(2), rect(1.0, 0.0, 3.0, 1.0)),
            ],
            params(),
        )
        .boundary()
        .unwrap();
        assert_eq!(prepared.regions.len(), 2);
        assert_relative_eq!(prepared.brep.total_area(), 3.0, epsilon = 1e-9);
        let core = prepared.regions.iter().find(|r| r.label == "core").unwrap();
        assert_relative_eq!(prepared.region_area(core.id), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn unresolved_overlap_aborts() {
        let err = MeshFromPolygons::new(
            vec![
                tagged("b", "sio2", rect(1.0, 0.0, 3.0, 1.0)),
                tagged("a", "si", rect(0.0, 0.0, 2.0, 1.0)),
            ],
            params(),
        )
        .boundary()
        .unwrap_err();
        let XsmeshError::StackAmbiguity(err) = err else {
            panic!("expected an ambiguity error, got {err}");
        };
        assert_eq!(err.layer_a.as_str(), "a");
        assert_eq!(err.layer_b.as_str(), "b");
        assert!(err.interval.is_none());
    }

    #[test]
    fn tied_priority_aborts() {
        let err = MeshFromPolygons::new(
            vec![
                TaggedPolygon::new(LayerTag::new("a", "si").with_mesh_order(1), rect(0.0, 0.0, 1.0, 1.0)),
                TaggedPolygon::new(LayerTag::new("b", "sin").with_mesh_order(1), rect(0.0, 0.0, 1.0, 1.0)),
            ],
            params(),
        )
        .boundary()
        .unwrap_err();
        assert!(matches!(err, XsmeshError::StackAmbiguity(_)));
    }

    #[test]
    fn same_material_layers_form_multi_tagged_region() {
        let prepared = MeshFromPolygons::new(
            vec![
                tagged("a", "si", rect(0.0, 0.0, 1.0, 1.0)),
                tagged("b", "si", rect(0.0, 0.0, 1.0, 1.0)),
            ],
            params(),
        )
        .boundary()
        .unwrap();
        assert_eq!(prepared.regions.len(), 1);
        assert_eq!(prepared.regions[0].label, "a+b");
        assert_eq!(prepared.regions[0].layers.len(), 2);
        assert_eq!(prepared.brep.surfaces.len(), 1);
    }

    #[test]
    fn degenerate_polygons_become_warnings() {
        init_tracing();
        let sliver = Polygon::new(
            vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(2.0, 0.000_1)],
            vec![],
        )
        .unwrap();
        let prepared = MeshFromPolygons::new(
            vec![tagged("a", "si", rect(0.0, 0.0, 1.0, 1.0)), tagged("b", "si", sliver)],
            params(),
        )
        .boundary()
        .unwrap();
        assert_eq!(prepared.regions.len(), 1);
        assert_eq!(prepared.warnings.len(), 1);
        assert!(matches!(
            &prepared.warnings[0],
            GeometryError::Excluded { index: 1, .. }
        ));
    }

    #[test]
    fn background_fills_padded_bounds() {
        let prepared = MeshFromPolygons::new(
            vec![tagged("core", "si", rect(0.0, 0.0, 1.0, 1.0))],
            MeshParameters {
                background: Some(Background {
                    layer: "bg".into(),
                    material: "air".into(),
                    padding: [1.0, 1.0, 1.0, 1.0],
                }),
                ..params()
            },
        )
        .boundary()
        .unwrap();
        assert_eq!(prepared.regions.len(), 2);
        let bg = prepared.regions.iter().find(|r| r.material == "air").unwrap();
        assert_relative_eq!(prepared.region_area(bg.id), 8.0, epsilon = 1e-9);
        assert_relative_eq!(prepared.brep.total_area(), 9.0, epsilon = 1e-9);
        assert_eq!(prepared.brep.surfaces.iter().find(|s| s.region == bg.id).unwrap().loops.len(), 2);
    }

    #[test]
    fn t_junctions_are_conformed() {
        let prepared = MeshFromPolygons::new(
            vec![
                tagged("box", "sio2", rect(0.0, 0.0, 2.0, 1.0)),
                tagged("left", "si", rect(0.0, 1.0, 1.0, 2.0)),
                tagged("right", "sin", rect(1.0, 1.0, 2.0, 2.0)),
            ],
            params(),
        )
        .boundary()
        .unwrap();
        assert_eq!(prepared.brep.interface_edges().count(), 3);
        assert!(prepared.brep.check_watertight().is_none());
    }

    #[test]
    fn diagonal_interface_is_shared() {
        let prepared = diagonal_split().boundary().unwrap();
        let brep = &prepared.brep;
        let on_diagonal = |i: usize| {
            let p = brep.points[i].position;
            (3.0 * p.x - 7.0 * p.y).abs() / 58f64.sqrt() < 2e-3
        };
        let diagonal: Vec<_> = brep
            .edges
            .iter()
            .filter(|e| on_diagonal(e.start) && on_diagonal(e.end))
            .collect();
        // The finer limit applies to both sides: ceil(sqrt(58) / 0.07) parts.
        assert_eq!(diagonal.len(), 109);
        assert!(diagonal.iter().all(|e| e.is_interface()));
        assert_eq!(brep.interface_edges().count(), 109);
        assert!(brep.check_watertight().is_none());
        assert_relative_eq!(brep.total_area(), 21.0, epsilon = 1e-9);
        for region in &prepared.regions {
            assert_relative_eq!(prepared.region_area(region.id), 10.5, epsilon = 1e-3);
        }
    }

    #[test]
    fn diagonal_interface_meshes_without_gaps() {
        init_tracing();
        let operation = diagonal_split();
        let prepared = operation.boundary().unwrap();
        let mesh = operation.execute(&CdtBackend::new()).unwrap();
        assert_relative_eq!(
            mesh.material_area("si") + mesh.material_area("sio2"),
            21.0,
            epsilon = 1e-9
        );
        for region in &prepared.regions {
            assert_relative_eq!(
                mesh.region_area(region.id),
                prepared.region_area(region.id),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn out_of_range_backend_output_is_rejected() {
        let err = MeshFromPolygons::new(vec![tagged("a", "si", rect(0.0, 0.0, 1.0, 1.0))], params())
            .execute(&StrayBackend)
            .unwrap_err();
        assert!(matches!(err, XsmeshError::Backend(BackendError::Malformed(_))));
    }

    #[test]
    fn boundary_segments_are_subdivided() {
        let prepared = MeshFromPolygons::new(
            vec![tagged("a", "si", rect(0.0, 0.0, 1.0, 1.0))],
            MeshParameters {
                max_boundary_segment: Some(0.25),
                ..params()
            },
        )
        .boundary()
        .unwrap();
        assert_eq!(prepared.brep.edges.len(), 16);
    }

    #[test]
    fn execute_meshes_each_region() {
        let mesh = MeshFromPolygons::new(
            vec![
                tagged("a", "si", rect(0.0, 0.0, 1.0, 1.0)),
                tagged("b", "sio2", rect(1.0, 0.0, 3.0, 1.0)),
            ],
            MeshParameters {
                scaling: 2.0,
                ..params()
            },
        )
        .execute(&CdtBackend::new())
        .unwrap();
        assert_eq!(mesh.triangle_regions.len(), mesh.mesh.triangles.len());
        assert_relative_eq!(mesh.material_area("si"), 4.0, epsilon = 1e-9);
        assert_relative_eq!(mesh.material_area("sio2"), 8.0, epsilon = 1e-9);
        assert!(mesh.region_by_label("b").is_some());
    }

    #[test]
    fn empty_input_fails_in_backend() {
        let err = MeshFromPolygons::new(vec![], params())
            .execute(&CdtBackend::new())
            .unwrap_err();
        assert!(matches!(err, XsmeshError::Backend(_)));
    }
}
