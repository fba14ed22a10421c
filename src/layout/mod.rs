//! Layout access and per-layer polygon preparation.

mod break_line;
mod extract;
mod fuse;
mod tile;

pub use break_line::{break_line, subdivide};
pub use extract::{CrossSection, LayoutExtractor};
pub use fuse::fuse;
pub use tile::{tile, Tile};

use std::collections::BTreeMap;

use crate::geometry::Polygon;
use crate::math::Rect;
use crate::stack::LayerId;

/// Read-only access to layout geometry.
///
/// Implementations must be safe to share between concurrent builds.
pub trait LayoutSource: Sync {
    /// Polygons on `layer`, restricted to those whose bounding box touches
    /// `bounds` when given. Unknown layers yield no polygons.
    fn polygons(&self, layer: &LayerId, bounds: Option<&Rect>) -> Vec<Polygon>;
}

/// In-memory layout keyed by layer.
#[derive(Debug, Clone, Default)]
pub struct LayoutDb {
    layers: BTreeMap<LayerId, Vec<Polygon>>,
}

impl LayoutDb {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a polygon to `layer`.
    pub fn insert(&mut self, layer: impl Into<LayerId>, polygon: Polygon) {
        self.layers.entry(layer.into()).or_default().push(polygon);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, layer: impl Into<LayerId>, polygon: Polygon) -> Self {
        self.insert(layer, polygon);
        self
    }

    pub fn layers(&self) -> impl Iterator<Item = &LayerId> {
        self.layers.keys()
    }

    /// Bounding box of every polygon in the layout.
    #[must_use]
    pub fn bounding_rect(&self) -> Option<Rect> {
        self.layers
            .values()
            .flatten()
            .map(Polygon::bounding_rect)
            .reduce(|a, b| a.union(&b))
    }
}

impl LayoutSource for LayoutDb {
    fn polygons(&self, layer: &LayerId, bounds: Option<&Rect>) -> Vec<Polygon> {
        let Some(polygons) = self.layers.get(layer) else {
            return Vec::new();
        };
        polygons
            .iter()
            .filter(|p| bounds.is_none_or(|b| p.bounding_rect().intersects(b)))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Point2;

    fn square(x: f64, y: f64) -> Polygon {
        Polygon::rectangle(&Rect::new(Point2::new(x, y), Point2::new(x + 1.0, y + 1.0)))
    }

    #[test]
    fn query_filters_by_bounds() {
        let db = LayoutDb::new().with("m1", square(0.0, 0.0)).with("m1", square(10.0, 0.0));
        let layer = LayerId::from("m1");
        assert_eq!(db.polygons(&layer, None).len(), 2);
        let window = Rect::new(Point2::new(-1.0, -1.0), Point2::new(2.0, 2.0));
        assert_eq!(db.polygons(&layer, Some(&window)).len(), 1);
        assert!(db.polygons(&LayerId::from("m2"), None).is_empty());
    }

    #[test]
    fn bounding_rect_spans_layers() {
        let db = LayoutDb::new().with("a", square(0.0, 0.0)).with("b", square(4.0, 5.0));
        let rect = db.bounding_rect();
        assert_eq!(rect.map(|r| r.max), Some(Point2::new(5.0, 6.0)));
        assert!(LayoutDb::new().bounding_rect().is_none());
    }
}
