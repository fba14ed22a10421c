use geo::{BooleanOps, MultiPolygon};

use crate::geometry::{compare_points, Polygon};
use crate::math::Normalizer;

/// Unions the polygons of one layer into disjoint maximal regions.
///
/// Output rings are snapped and free of collinear vertices, exteriors are
/// counter-clockwise, and the list is sorted by leftmost-bottom vertex, so
/// fusing an already fused set returns it unchanged.
#[must_use]
pub fn fuse(polygons: &[Polygon], normalizer: &Normalizer) -> Vec<Polygon> {
    let mut merged = MultiPolygon::new(Vec::new());
    for polygon in polygons {
        merged = merged.union(&MultiPolygon::new(vec![polygon.to_geo()]));
    }
    from_multi_polygon(&merged, normalizer)
}

/// Converts boolean-operation output back to clean polygons, discarding
/// pieces that collapse under snapping.
pub(crate) fn from_multi_polygon(multi: &MultiPolygon<f64>, normalizer: &Normalizer) -> Vec<Polygon> {
    let mut out: Vec<Polygon> = multi
        .0
        .iter()
        .filter_map(|geo_polygon| {
            let polygon = match Polygon::from_geo(geo_polygon) {
                Ok(p) => p,
                Err(err) => {
                    tracing::debug!(%err, "dropping degenerate boolean fragment");
                    return None;
                }
            };
            match normalizer.normalize_polygon(&polygon) {
                Ok(p) => Some(p.canonical()),
                Err(err) => {
                    tracing::debug!(%err, "dropping fragment collapsed by snapping");
                    None
                }
            }
        })
        .collect();
    sort_polygons(&mut out);
    out
}

/// Deterministic order: by first (leftmost-bottom) vertex, then area.
pub(crate) fn sort_polygons(polygons: &mut [Polygon]) {
    polygons.sort_by(|a, b| {
        compare_points(&a.exterior()[0], &b.exterior()[0]).then(a.area().total_cmp(&b.area()))
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Point2, Rect};
    use approx::assert_relative_eq;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::rectangle(&Rect::new(Point2::new(x0, y0), Point2::new(x1, y1)))
    }

    fn normalizer() -> Normalizer {
        Normalizer::new(1e-3).unwrap()
    }

    #[test]
    fn adjacent_squares_fuse_into_rectangle() {
        let fused = fuse(&[rect(0.0, 0.0, 1.0, 1.0), rect(1.0, 0.0, 2.0, 1.0)], &normalizer());
        assert_eq!(fused.len(), 1);
        let r = &fused[0];
        assert_eq!(r.exterior().len(), 4);
        assert!(r.holes().is_empty());
        assert_relative_eq!(r.area(), 2.0, epsilon = 1e-9);
        assert_relative_eq!(r.perimeter(), 6.0, epsilon = 1e-9);
    }

    #[test]
    fn overlapping_squares_fuse() {
        let fused = fuse(&[rect(0.0, 0.0, 2.0, 2.0), rect(1.0, 1.0, 3.0, 3.0)], &normalizer());
        assert_eq!(fused.len(), 1);
        assert_relative_eq!(fused[0].area(), 7.0, epsilon = 1e-9);
    }

    #[test]
    fn disjoint_squares_stay_apart() {
        let fused = fuse(&[rect(5.0, 0.0, 6.0, 1.0), rect(0.0, 0.0, 1.0, 1.0)], &normalizer());
        assert_eq!(fused.len(), 2);
        assert_eq!(fused[0].exterior()[0], Point2::new(0.0, 0.0));
    }

    #[test]
    fn ring_of_squares_keeps_hole() {
        let parts = [
            rect(0.0, 0.0, 3.0, 1.0),
            rect(0.0, 2.0, 3.0, 3.0),
            rect(0.0, 1.0, 1.0, 2.0),
            rect(2.0, 1.0, 3.0, 2.0),
        ];
        let fused = fuse(&parts, &normalizer());
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].holes().len(), 1);
        assert_relative_eq!(fused[0].area(), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn fusing_is_idempotent() {
        let n = normalizer();
        let once = fuse(
            &[rect(0.0, 0.0, 1.0, 1.0), rect(0.5, 0.5, 2.0, 1.5), rect(4.0, 4.0, 5.0, 5.0)],
            &n,
        );
        let twice = fuse(&once, &n);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_input() {
        assert!(fuse(&[], &normalizer()).is_empty());
    }
}
