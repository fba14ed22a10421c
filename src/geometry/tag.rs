use super::Polygon;
use crate::stack::LayerId;

/// Layer and material label carried by a polygon through a build.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayerTag {
    pub layer: LayerId,
    pub material: String,
    /// Declared meshing priority; lower values win where layers overlap.
    pub mesh_order: Option<i32>,
}

impl LayerTag {
    #[must_use]
    pub fn new(layer: impl Into<LayerId>, material: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            material: material.into(),
            mesh_order: None,
        }
    }

    #[must_use]
    pub fn with_mesh_order(mut self, mesh_order: i32) -> Self {
        self.mesh_order = Some(mesh_order);
        self
    }
}

/// A polygon labelled with the layer it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedPolygon {
    pub tag: LayerTag,
    pub polygon: Polygon,
}

impl TaggedPolygon {
    #[must_use]
    pub fn new(tag: LayerTag, polygon: Polygon) -> Self {
        Self { tag, polygon }
    }
}
