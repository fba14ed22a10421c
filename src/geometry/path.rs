use crate::error::GeometryError;
use crate::math::{Point2, Rect, TOLERANCE};

/// An open polyline along which a u-z cross-section is swept.
///
/// The `u` coordinate of the cross-section is the arc length measured from
/// the first vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    points: Vec<Point2>,
    /// Cumulative arc length at each vertex.
    stations: Vec<f64>,
}

impl Path {
    /// Creates a path, dropping zero-length segments.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidPath`] if fewer than two distinct
    /// vertices remain or a coordinate is not finite.
    pub fn new(points: Vec<Point2>) -> Result<Self, GeometryError> {
        if let Some(p) = points.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(GeometryError::NonFinite { x: p.x, y: p.y });
        }
        let mut kept: Vec<Point2> = Vec::with_capacity(points.len());
        for p in points {
            if kept.last().is_none_or(|last| (p - last).norm() > TOLERANCE) {
                kept.push(p);
            }
        }
        if kept.len() < 2 {
            return Err(GeometryError::InvalidPath(
                "a path needs at least two distinct vertices".into(),
            ));
        }
        let mut stations = Vec::with_capacity(kept.len());
        let mut running = 0.0;
        stations.push(running);
        for w in kept.windows(2) {
            running += (w[1] - w[0]).norm();
            stations.push(running);
        }
        Ok(Self {
            points: kept,
            stations,
        })
    }

    /// Straight path between two points.
    ///
    /// # Errors
    ///
    /// Returns an error if the points coincide.
    pub fn line(start: Point2, end: Point2) -> Result<Self, GeometryError> {
        Self::new(vec![start, end])
    }

    #[must_use]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Total arc length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.stations.last().copied().unwrap_or(0.0)
    }

    /// Iterates over segments as `(start, end, u_at_start)`.
    pub fn segments(&self) -> impl Iterator<Item = (Point2, Point2, f64)> + '_ {
        self.points
            .windows(2)
            .zip(&self.stations)
            .map(|(w, &u)| (w[0], w[1], u))
    }

    #[must_use]
    pub fn bounding_rect(&self) -> Rect {
        Rect::bounding(&self.points).unwrap_or(Rect::new(Point2::origin(), Point2::origin()))
    }
}
