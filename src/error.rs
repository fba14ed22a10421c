use std::fmt;

use thiserror::Error;

use crate::stack::{LayerId, ZInterval};

/// Top-level error type for cross-section meshing.
#[derive(Debug, Error)]
pub enum XsmeshError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    StackAmbiguity(#[from] StackAmbiguityError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Degenerate or invalid input geometry.
///
/// Inside a build these are recovered by excluding the offending polygon.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("ring has {count} distinct vertices, at least 3 are required")]
    TooFewVertices { count: usize },

    #[error("polygon has zero area after normalization")]
    ZeroArea,

    #[error("non-finite coordinate ({x}, {y})")]
    NonFinite { x: f64, y: f64 },

    #[error("invalid resolution {0}, must be positive and finite")]
    InvalidResolution(f64),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("polygon {index} on layer `{layer}` excluded: {reason}")]
    Excluded {
        layer: LayerId,
        index: usize,
        reason: Box<GeometryError>,
    },
}

/// Two layers cover the same area with different materials and no priority
/// separating them.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("ambiguous layer stack: `{layer_a}` and `{layer_b}` are co-located{}", IntervalSuffix(.interval.as_ref()))]
pub struct StackAmbiguityError {
    pub layer_a: LayerId,
    pub layer_b: LayerId,
    /// Vertical overlap of the two layers, when known.
    pub interval: Option<ZInterval>,
}

struct IntervalSuffix<'a>(Option<&'a ZInterval>);

impl fmt::Display for IntervalSuffix<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(interval) => write!(f, " over z in [{}, {})", interval.lo(), interval.hi()),
            None => Ok(()),
        }
    }
}

/// Errors reported by a meshing backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("boundary representation rejected: {0}")]
    Rejected(String),

    #[error("vertex insertion failed: {0}")]
    Insertion(String),

    #[error("boundary representation has no surfaces")]
    Empty,

    #[error("backend returned a malformed mesh: {0}")]
    Malformed(String),
}

/// Errors related to the topology tracker.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("tracker is finalized")]
    Finalized,

    #[error("degenerate edge: both endpoints snap to the same point")]
    DegenerateEdge,

    #[error("boundary representation is not watertight: {0}")]
    OpenBoundary(String),
}

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate layer `{0}` in layer stack")]
    DuplicateLayer(LayerId),

    #[error("layer `{layer}` has z_min {z_min} >= z_max {z_max}")]
    InvalidZRange { layer: LayerId, z_min: f64, z_max: f64 },

    #[error("invalid parameter {parameter} = {value}")]
    InvalidParameter { parameter: &'static str, value: f64 },
}

/// Convenience type alias for results using [`XsmeshError`].
pub type Result<T> = std::result::Result<T, XsmeshError>;
