use super::{Point2, TOLERANCE};

/// Bounded segment-segment intersection in 2D.
///
/// Returns `(intersection_point, t, u)` where `t` and `u` are the parameters
/// on `a` and `b`, both in `[0, 1]`. Parallel segments never intersect here;
/// collinear overlap is left to the caller.
#[must_use]
pub fn segment_segment_intersect_2d(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
) -> Option<(Point2, f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;

    let cross = da.x * db.y - da.y * db.x;
    if cross.abs() < TOLERANCE {
        return None;
    }

    let dx = b0.x - a0.x;
    let dy = b0.y - a0.y;
    let t = (dx * db.y - dy * db.x) / cross;
    let u = (dx * da.y - dy * da.x) / cross;

    // Use a small epsilon to include endpoints.
    let eps = TOLERANCE;
    if t >= -eps && t <= 1.0 + eps && u >= -eps && u <= 1.0 + eps {
        let t_clamped = t.clamp(0.0, 1.0);
        let pt = a0 + da * t_clamped;
        Some((pt, t_clamped, u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Parameters along the segment `a0`-`a1` where it crosses the edges of a
/// closed ring, unsorted.
#[must_use]
pub fn segment_ring_crossings(a0: &Point2, a1: &Point2, ring: &[Point2]) -> Vec<f64> {
    let n = ring.len();
    let mut params = Vec::new();
    for i in 0..n {
        let b0 = &ring[i];
        let b1 = &ring[(i + 1) % n];
        if let Some((_, t, _)) = segment_segment_intersect_2d(a0, a1, b0, b1) {
            params.push(t);
        }
    }
    params
}
