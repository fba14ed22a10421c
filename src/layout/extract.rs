use geo::{BooleanOps, MultiPolygon};

use super::fuse::from_multi_polygon;
use super::LayoutSource;
use crate::geometry::{Path, Polygon};
use crate::math::intersect_2d::segment_ring_crossings;
use crate::math::{Normalizer, Point2, Rect, TOLERANCE};
use crate::stack::{LayerStackEntry, ZInterval};

/// Which slice of the layout to mesh.
#[derive(Debug, Clone, PartialEq)]
pub enum CrossSection {
    /// Horizontal x-y slice at height `z`, optionally clipped to `bounds`.
    Planar { z: f64, bounds: Option<Rect> },
    /// Vertical u-z slice along `path` (`u` is arc length), optionally
    /// limited to `z_range`.
    Swept {
        path: Path,
        z_range: Option<ZInterval>,
    },
}

impl CrossSection {
    #[must_use]
    pub fn planar(z: f64) -> Self {
        Self::Planar { z, bounds: None }
    }

    #[must_use]
    pub fn swept(path: Path) -> Self {
        Self::Swept {
            path,
            z_range: None,
        }
    }
}

/// Pulls per-layer polygons out of a layout for one cross-section.
pub struct LayoutExtractor<'a> {
    layout: &'a dyn LayoutSource,
    normalizer: Normalizer,
}

impl<'a> LayoutExtractor<'a> {
    #[must_use]
    pub fn new(layout: &'a dyn LayoutSource, normalizer: Normalizer) -> Self {
        Self { layout, normalizer }
    }

    /// Raw polygons of `entry`'s layer in `cross_section`.
    ///
    /// A layer that does not intersect the cross-section yields an empty list.
    #[must_use]
    pub fn extract(&self, entry: &LayerStackEntry, cross_section: &CrossSection) -> Vec<Polygon> {
        match cross_section {
            CrossSection::Planar { z, bounds } => self.extract_planar(entry, *z, bounds.as_ref()),
            CrossSection::Swept { path, z_range } => {
                self.extract_swept(entry, path, z_range.as_ref())
            }
        }
    }

    fn extract_planar(&self, entry: &LayerStackEntry, z: f64, bounds: Option<&Rect>) -> Vec<Polygon> {
        if !entry.contains_z(z, &self.normalizer) {
            return Vec::new();
        }
        let polygons = self.layout.polygons(entry.layer(), bounds);
        let Some(bounds) = bounds else {
            return polygons;
        };
        let window = MultiPolygon::new(vec![Polygon::rectangle(bounds).to_geo()]);
        polygons
            .iter()
            .flat_map(|p| {
                let clipped = MultiPolygon::new(vec![p.to_geo()]).intersection(&window);
                from_multi_polygon(&clipped, &self.normalizer)
            })
            .collect()
    }

    fn extract_swept(
        &self,
        entry: &LayerStackEntry,
        path: &Path,
        z_range: Option<&ZInterval>,
    ) -> Vec<Polygon> {
        let span = entry
            .interval(&self.normalizer)
            .and_then(|own| match z_range {
                Some(range) => range.intersection(&own),
                None => Some(own),
            });
        let Some(span) = span else {
            return Vec::new();
        };
        let polygons = self.layout.polygons(entry.layer(), Some(&path.bounding_rect()));
        let mut out = Vec::new();
        for polygon in &polygons {
            for (u0, u1) in path_intervals(path, polygon) {
                if u1 - u0 < self.normalizer.epsilon() {
                    continue;
                }
                let rect = Rect::new(Point2::new(u0, span.lo()), Point2::new(u1, span.hi()));
                out.push(Polygon::rectangle(&rect));
            }
        }
        out
    }
}

/// Arc-length intervals where `path` runs inside `polygon`, merged where they
/// touch.
#[must_use]
pub fn path_intervals(path: &Path, polygon: &Polygon) -> Vec<(f64, f64)> {
    let mut intervals: Vec<(f64, f64)> = Vec::new();
    for (a, b, u_start) in path.segments() {
        let length = (b - a).norm();
        let mut ts: Vec<f64> = vec![0.0, 1.0];
        for ring in polygon.rings() {
            ts.extend(segment_ring_crossings(&a, &b, ring));
        }
        ts.sort_by(f64::total_cmp);
        ts.dedup_by(|x, y| (*x - *y).abs() * length < TOLERANCE);
        for w in ts.windows(2) {
            let mid = a + (b - a) * (0.5 * (w[0] + w[1]));
            if !polygon.contains(&mid) {
                continue;
            }
            let (u0, u1) = (u_start + w[0] * length, u_start + w[1] * length);
            match intervals.last_mut() {
                Some(last) if (u0 - last.1).abs() < TOLERANCE => last.1 = u1,
                _ => intervals.push((u0, u1)),
            }
        }
    }
    intervals
}
