use geo::{Area, BooleanOps, MultiPolygon};

use super::fuse::from_multi_polygon;
use crate::geometry::{to_multi_polygon, LayerTag, Polygon};
use crate::math::Normalizer;

/// A disjoint piece of the covered area and every layer covering it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// Covering layers, in input order.
    pub tags: Vec<LayerTag>,
    pub polygon: Polygon,
}

impl Tile {
    /// Returns `true` if more than one layer covers this piece.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        self.tags.len() > 1
    }
}

/// Partitions the area covered by several layers into disjoint pieces, each
/// tagged with the set of layers covering it.
///
/// Each layer's polygons are expected to be fused already. Pieces smaller than
/// one grid cell are discarded.
#[must_use]
pub fn tile(layers: &[(LayerTag, Vec<Polygon>)], normalizer: &Normalizer) -> Vec<Tile> {
    let min_area = normalizer.epsilon() * normalizer.epsilon();
    let is_empty = |m: &MultiPolygon<f64>| m.unsigned_area() < min_area;

    // Each piece: indices of covering layers and its (multi)polygon.
    let mut pieces: Vec<(Vec<usize>, MultiPolygon<f64>)> = Vec::new();
    for (index, (_, polygons)) in layers.iter().enumerate() {
        let shape = to_multi_polygon(polygons);
        if is_empty(&shape) {
            continue;
        }
        let mut remaining = shape.clone();
        let mut next = Vec::with_capacity(pieces.len() * 2 + 1);
        for (covering, piece) in pieces {
            let inside = piece.intersection(&shape);
            if is_empty(&inside) {
                next.push((covering, piece));
                continue;
            }
            let outside = piece.difference(&shape);
            remaining = remaining.difference(&piece);
            let mut shared = covering.clone();
            shared.push(index);
            next.push((shared, inside));
            if !is_empty(&outside) {
                next.push((covering, outside));
            }
        }
        if !is_empty(&remaining) {
            next.push((vec![index], remaining));
        }
        pieces = next;
    }

    let mut tiles: Vec<Tile> = Vec::new();
    for (covering, piece) in &pieces {
        let tags: Vec<LayerTag> = covering.iter().map(|&i| layers[i].0.clone()).collect();
        for polygon in from_multi_polygon(piece, normalizer) {
            tiles.push(Tile {
                tags: tags.clone(),
                polygon,
            });
        }
    }
    tiles.sort_by(|a, b| {
        crate::geometry::compare_points(&a.polygon.exterior()[0], &b.polygon.exterior()[0])
            .then(a.tags.len().cmp(&b.tags.len()))
    });
    tracing::debug!(layers = layers.len(), tiles = tiles.len(), "tiled layers");
    tiles
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

    fn layer(name: &str, polygons: Vec<Polygon>) -> (LayerTag, Vec<Polygon>) {
        (LayerTag::new(name, "mat"), polygons)
    }

    fn normalizer() -> Normalizer {
        Normalizer::new(1e-3).unwrap()
    }

    #[test]
    fn overlap_becomes_shared_tile() {
        let tiles = tile(
            &[
                layer("a", vec![rect(0.0, 0.0, 2.0, 1.0)]),
                layer("b", vec![rect(1.0, 0.0, 3.0, 1.0)]),
            ],
            &normalizer(),
        );
        assert_eq!(tiles.len(), 3);
        let shared: Vec<_> = tiles.iter().filter(|t| t.is_shared()).collect();
        assert_eq!(shared.len(), 1);
        assert_relative_eq!(shared[0].polygon.area(), 1.0, epsilon = 1e-9);
        let total: f64 = tiles.iter().map(|t| t.polygon.area()).sum();
        assert_relative_eq!(total, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn disjoint_layers_keep_single_tags() {
        let tiles = tile(
            &[
                layer("a", vec![rect(0.0, 0.0, 1.0, 1.0)]),
                layer("b", vec![rect(1.0, 0.0, 2.0, 1.0)]),
            ],
            &normalizer(),
        );
        assert_eq!(tiles.len(), 2);
        assert!(tiles.iter().all(|t| !t.is_shared()));
        assert_eq!(tiles[0].tags[0].layer.as_str(), "a");
    }

    #[test]
    fn nested_layer_splits_outer() {
        let tiles = tile(
            &[
                layer("clad", vec![rect(0.0, 0.0, 4.0, 4.0)]),
                layer("core", vec![rect(1.0, 1.0, 2.0, 2.0)]),
            ],
            &normalizer(),
        );
        assert_eq!(tiles.len(), 2);
        let outer = tiles.iter().find(|t| !t.is_shared()).unwrap();
        assert_eq!(outer.polygon.holes().len(), 1);
        assert_relative_eq!(outer.polygon.area(), 15.0, epsilon = 1e-9);
    }

    #[test]
    fn identical_layers_share_one_tile() {
        let tiles = tile(
            &[
                layer("a", vec![rect(0.0, 0.0, 1.0, 1.0)]),
                layer("b", vec![rect(0.0, 0.0, 1.0, 1.0)]),
            ],
            &normalizer(),
        );
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].tags.len(), 2);
    }

    #[test]
    fn empty_layers_ignored() {
        let tiles = tile(&[layer("a", vec![]), layer("b", vec![rect(0.0, 0.0, 1.0, 1.0)])], &normalizer());
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].tags[0].layer.as_str(), "b");
    }
}
