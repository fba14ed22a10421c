use geo::{Coord, LineString, MultiPolygon, Polygon as GeoPolygon};

use crate::error::GeometryError;
use crate::math::polygon_2d::{
    point_in_ring, rotate_to_canonical_start, signed_area, to_ccw, to_cw,
};
use crate::math::{Point2, Rect};

/// A planar polygon with optional holes.
///
/// Rings are stored open: the closing vertex is not repeated.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    exterior: Vec<Point2>,
    holes: Vec<Vec<Point2>>,
}

impl Polygon {
    /// Creates a polygon, validating vertex counts and coordinates.
    ///
    /// A trailing vertex equal to the first one is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::TooFewVertices`] if a ring has fewer than 3
    /// vertices, or [`GeometryError::NonFinite`] for NaN/infinite coordinates.
    pub fn new(exterior: Vec<Point2>, holes: Vec<Vec<Point2>>) -> Result<Self, GeometryError> {
        let exterior = open_ring(exterior);
        validate_ring(&exterior)?;
        let mut open_holes = Vec::with_capacity(holes.len());
        for hole in holes {
            let hole = open_ring(hole);
            validate_ring(&hole)?;
            open_holes.push(hole);
        }
        Ok(Self {
            exterior,
            holes: open_holes,
        })
    }

    /// Axis-aligned rectangle as a counter-clockwise polygon.
    #[must_use]
    pub fn rectangle(rect: &Rect) -> Self {
        Self {
            exterior: rect.corners().to_vec(),
            holes: Vec::new(),
        }
    }

    #[must_use]
    pub fn exterior(&self) -> &[Point2] {
        &self.exterior
    }

    #[must_use]
    pub fn holes(&self) -> &[Vec<Point2>] {
        &self.holes
    }

    /// Iterates over the exterior followed by every hole.
    pub fn rings(&self) -> impl Iterator<Item = &[Point2]> {
        std::iter::once(self.exterior.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }

    /// Enclosed area: exterior minus holes.
    #[must_use]
    pub fn area(&self) -> f64 {
        signed_area(&self.exterior).abs()
            - self.holes.iter().map(|h| signed_area(h).abs()).sum::<f64>()
    }

    /// Total boundary length over all rings.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        self.rings().map(crate::math::polygon_2d::ring_perimeter).sum()
    }

    #[must_use]
    pub fn bounding_rect(&self) -> Rect {
        // Construction guarantees a non-empty exterior.
        Rect::bounding(&self.exterior).unwrap_or(Rect::new(Point2::origin(), Point2::origin()))
    }

    /// Even-odd containment against the exterior and holes.
    #[must_use]
    pub fn contains(&self, p: &Point2) -> bool {
        point_in_ring(p, &self.exterior) && !self.holes.iter().any(|h| point_in_ring(p, h))
    }

    /// Returns the polygon with a counter-clockwise exterior, clockwise holes,
    /// every ring starting at its leftmost-bottom vertex and holes sorted by
    /// that vertex.
    #[must_use]
    pub fn canonical(&self) -> Self {
        let exterior = rotate_to_canonical_start(&to_ccw(&self.exterior));
        let mut holes: Vec<_> = self
            .holes
            .iter()
            .map(|h| rotate_to_canonical_start(&to_cw(h)))
            .collect();
        holes.sort_by(|a, b| compare_points(&a[0], &b[0]));
        Self { exterior, holes }
    }

    /// Converts to a `geo` polygon for boolean operations.
    #[must_use]
    pub fn to_geo(&self) -> GeoPolygon<f64> {
        GeoPolygon::new(
            ring_to_line_string(&self.exterior),
            self.holes.iter().map(|h| ring_to_line_string(h)).collect(),
        )
    }

    /// Converts a `geo` polygon back, dropping rings that are too small to be
    /// polygons.
    ///
    /// # Errors
    ///
    /// Returns an error if the exterior is degenerate.
    pub fn from_geo(polygon: &GeoPolygon<f64>) -> Result<Self, GeometryError> {
        let exterior = line_string_to_ring(polygon.exterior());
        let holes = polygon
            .interiors()
            .iter()
            .map(line_string_to_ring)
            .filter(|h| h.len() >= 3)
            .collect();
        Self::new(exterior, holes)
    }
}

/// Collects polygons into a `geo` multipolygon.
#[must_use]
pub fn to_multi_polygon(polygons: &[Polygon]) -> MultiPolygon<f64> {
    MultiPolygon::new(polygons.iter().map(Polygon::to_geo).collect())
}

/// Lexicographic order on `(x, y)`.
#[must_use]
pub fn compare_points(a: &Point2, b: &Point2) -> std::cmp::Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

fn open_ring(mut ring: Vec<Point2>) -> Vec<Point2> {
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    ring
}

fn validate_ring(ring: &[Point2]) -> Result<(), GeometryError> {
    if ring.len() < 3 {
        return Err(GeometryError::TooFewVertices { count: ring.len() });
    }
    if let Some(p) = ring.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(GeometryError::NonFinite { x: p.x, y: p.y });
    }
    Ok(())
}

fn ring_to_line_string(ring: &[Point2]) -> LineString<f64> {
    LineString::new(ring.iter().map(|p| Coord { x: p.x, y: p.y }).collect())
}

fn line_string_to_ring(line: &LineString<f64>) -> Vec<Point2> {
    open_ring(line.0.iter().map(|c| Point2::new(c.x, c.y)).collect())
}
