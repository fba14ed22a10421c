use super::polygon_2d::{cross_2d, signed_area};
use super::{Point2, TOLERANCE};
use crate::error::GeometryError;
use crate::geometry::Polygon;

/// Default snapping resolution (four decimal places in layout units).
pub const DEFAULT_RESOLUTION: f64 = 1e-4;

/// Integer grid coordinates of a snapped point.
///
/// Two points compare equal as topology exactly when their keys are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridKey(pub i64, pub i64);

/// Snaps coordinates to a grid of spacing `ε` (round-to-nearest).
///
/// Every equality or adjacency test in a build goes through one normalizer so
/// that nearly coincident vertices collapse before topology is built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    epsilon: f64,
    scale: f64,
}

impl Normalizer {
    /// Creates a normalizer with grid spacing `epsilon`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidResolution`] if `epsilon` is not
    /// positive and finite.
    pub fn new(epsilon: f64) -> Result<Self, GeometryError> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(GeometryError::InvalidResolution(epsilon));
        }
        let mut scale = 1.0 / epsilon;
        // 1e-3 and friends are not exact in binary; an integral scale keeps
        // `snap` exact for decimal grids.
        if (scale - scale.round()).abs() < 1e-6 * scale {
            scale = scale.round();
        }
        Ok(Self { epsilon, scale })
    }

    /// Grid spacing.
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Snaps a single coordinate.
    #[must_use]
    pub fn snap(&self, value: f64) -> f64 {
        let snapped = (value * self.scale).round() / self.scale;
        // Avoid -0.0 so that formatted output and hashing of snapped values agree.
        if snapped == 0.0 {
            0.0
        } else {
            snapped
        }
    }

    /// Snaps both coordinates of a point.
    #[must_use]
    pub fn snap_point(&self, p: &Point2) -> Point2 {
        Point2::new(self.snap(p.x), self.snap(p.y))
    }

    /// Index of the grid line nearest to `value`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn grid_index(&self, value: f64) -> i64 {
        (value * self.scale).round() as i64
    }

    /// Coordinate of grid line `index`; equal to the snapped value.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::wrong_self_convention)]
    pub fn from_grid_index(&self, index: i64) -> f64 {
        let value = index as f64 / self.scale;
        if value == 0.0 {
            0.0
        } else {
            value
        }
    }

    /// Integer grid key of a point.
    #[must_use]
    pub fn key(&self, p: &Point2) -> GridKey {
        GridKey(self.grid_index(p.x), self.grid_index(p.y))
    }

    /// Returns `true` if `a` and `b` snap to the same grid point.
    #[must_use]
    pub fn coincident(&self, a: &Point2, b: &Point2) -> bool {
        self.key(a) == self.key(b)
    }

    /// Snaps a ring and removes consecutive duplicates, including the closing
    /// vertex when the ring is stored closed.
    #[must_use]
    pub fn normalize_ring(&self, ring: &[Point2]) -> Vec<Point2> {
        let mut out: Vec<Point2> = Vec::with_capacity(ring.len());
        for p in ring {
            let q = self.snap_point(p);
            if out.last().is_none_or(|last| !self.coincident(last, &q)) {
                out.push(q);
            }
        }
        while out.len() > 1 && out.first().zip(out.last()).is_some_and(|(a, b)| self.coincident(a, b)) {
            out.pop();
        }
        out
    }

    /// Removes vertices whose neighbours are collinear with them, as well as
    /// zero-width spikes. Repeats until stable.
    #[must_use]
    pub fn simplify_ring(&self, ring: &[Point2]) -> Vec<Point2> {
        let mut pts = self.normalize_ring(ring);
        // Collinearity is judged against the grid: the deviation of the middle
        // vertex from the chord must stay under half a cell.
        let limit = self.epsilon * 0.5;
        loop {
            let n = pts.len();
            if n < 3 {
                return pts;
            }
            let mut removed = false;
            let mut kept = Vec::with_capacity(n);
            for i in 0..n {
                let prev = kept.last().copied().unwrap_or(pts[(i + n - 1) % n]);
                let cur = pts[i];
                let next = pts[(i + 1) % n];
                let chord = next - prev;
                let len = chord.norm();
                let deviation = if len < TOLERANCE {
                    (cur - prev).norm()
                } else {
                    cross_2d(&chord, &(cur - prev)).abs() / len
                };
                if deviation <= limit || len < TOLERANCE {
                    removed = true;
                } else {
                    kept.push(cur);
                }
            }
            if !removed {
                return pts;
            }
            pts = kept;
        }
    }

    /// Snaps every ring of `polygon` and validates the result.
    ///
    /// Degenerate holes are dropped silently; a degenerate exterior is an error.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::TooFewVertices`] or [`GeometryError::ZeroArea`]
    /// when the exterior collapses.
    pub fn normalize_polygon(&self, polygon: &Polygon) -> Result<Polygon, GeometryError> {
        let exterior = self.simplify_ring(polygon.exterior());
        if exterior.len() < 3 {
            return Err(GeometryError::TooFewVertices {
                count: exterior.len(),
            });
        }
        if signed_area(&exterior).abs() < self.epsilon * self.epsilon {
            return Err(GeometryError::ZeroArea);
        }
        let holes = polygon
            .holes()
            .iter()
            .map(|h| self.simplify_ring(h))
            .filter(|h| h.len() >= 3 && signed_area(h).abs() >= self.epsilon * self.epsilon)
            .collect();
        Polygon::new(exterior, holes)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_RESOLUTION,
            scale: (1.0 / DEFAULT_RESOLUTION).round(),
        }
    }
}
