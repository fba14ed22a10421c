use crate::geometry::{compare_points, Polygon};
use crate::math::Point2;

/// Subdivides every edge longer than `max_segment_length` into equal parts.
///
/// Intermediate points are generated from the lexicographically smaller
/// endpoint, so an edge shared by two polygons (and walked in opposite
/// directions) receives bit-identical points in both. A non-positive or
/// non-finite limit returns the polygon unchanged.
#[must_use]
pub fn break_line(polygon: &Polygon, max_segment_length: f64) -> Polygon {
    if !max_segment_length.is_finite() || max_segment_length <= 0.0 {
        return polygon.clone();
    }
    let exterior = break_ring(polygon.exterior(), max_segment_length);
    let holes = polygon
        .holes()
        .iter()
        .map(|h| break_ring(h, max_segment_length))
        .collect();
    // Subdivision only adds vertices, so ring validity is preserved.
    Polygon::new(exterior, holes).unwrap_or_else(|_| polygon.clone())
}

/// Subdivides one closed ring.
#[must_use]
pub fn break_ring(ring: &[Point2], max_segment_length: f64) -> Vec<Point2> {
    let n = ring.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        out.push(a);
        out.extend(subdivide(&a, &b, max_segment_length));
    }
    out
}

/// Interior subdivision points of the segment `a`-`b`, ordered from `a` to `b`.
#[must_use]
pub fn subdivide(a: &Point2, b: &Point2, max_segment_length: f64) -> Vec<Point2> {
    let length = (b - a).norm();
    if length <= max_segment_length {
        return Vec::new();
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let parts = (length / max_segment_length).ceil() as usize;
    let reversed = compare_points(a, b).is_gt();
    let (from, to) = if reversed { (b, a) } else { (a, b) };
    let delta = to - from;
    let mut points: Vec<Point2> = (1..parts)
        .map(|k| {
            #[allow(clippy::cast_precision_loss)]
            let t = k as f64 / parts as f64;
            from + delta * t
        })
        .collect();
    if reversed {
        points.reverse();
    }
    points
}
