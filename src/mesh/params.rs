use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::math::DEFAULT_RESOLUTION;
use crate::stack::LayerId;

/// Quality knobs passed to the meshing backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshQuality {
    /// Largest element edge length wanted away from finer regions.
    pub target_element_size: f64,
    /// Shrink elements near short boundary edges (discretized curves).
    pub curvature_refinement: bool,
    /// Minimum acceptable element quality in `[0, 1]`; 1 asks for the
    /// best angles the backend can guarantee.
    pub min_element_quality: f64,
}

impl Default for MeshQuality {
    fn default() -> Self {
        Self {
            target_element_size: 0.5,
            curvature_refinement: false,
            min_element_quality: 0.5,
        }
    }
}

/// Per-layer size overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerResolution {
    /// Element size inside regions of this layer.
    pub element_size: Option<f64>,
    /// Longest boundary segment on this layer's region boundaries.
    pub boundary_segment: Option<f64>,
}

/// A filler region around the geometry's bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    /// Layer name used to tag the filler region.
    pub layer: LayerId,
    pub material: String,
    /// Padding as `[left, bottom, right, top]`.
    #[serde(default)]
    pub padding: [f64; 4],
}

/// Everything a build needs besides geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshParameters {
    /// Snapping grid spacing.
    pub resolution: f64,
    pub quality: MeshQuality,
    /// Size overrides keyed by layer.
    pub resolutions: BTreeMap<LayerId, LayerResolution>,
    /// Longest boundary segment where no layer override applies.
    pub max_boundary_segment: Option<f64>,
    pub background: Option<Background>,
    /// Factor applied to output mesh coordinates.
    pub scaling: f64,
}

impl Default for MeshParameters {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            quality: MeshQuality::default(),
            resolutions: BTreeMap::new(),
            max_boundary_segment: None,
            background: None,
            scaling: 1.0,
        }
    }
}

impl MeshParameters {
    /// Parses and validates parameters from JSON; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON or
    /// [`ConfigError::InvalidParameter`] for out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParameter`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("resolution", self.resolution)?;
        positive("quality.target_element_size", self.quality.target_element_size)?;
        positive("scaling", self.scaling)?;
        let q = self.quality.min_element_quality;
        if !(0.0..=1.0).contains(&q) {
            return Err(ConfigError::InvalidParameter {
                parameter: "quality.min_element_quality",
                value: q,
            });
        }
        if let Some(s) = self.max_boundary_segment {
            positive("max_boundary_segment", s)?;
        }
        for r in self.resolutions.values() {
            if let Some(s) = r.element_size {
                positive("resolutions.element_size", s)?;
            }
            if let Some(s) = r.boundary_segment {
                positive("resolutions.boundary_segment", s)?;
            }
        }
        if let Some(bg) = &self.background {
            for pad in bg.padding {
                if !pad.is_finite() || pad < 0.0 {
                    return Err(ConfigError::InvalidParameter {
                        parameter: "background.padding",
                        value: pad,
                    });
                }
            }
        }
        Ok(())
    }

    /// Element size for a region covered by `layers`: the finest override
    /// among them, if any.
    #[must_use]
    pub fn element_size_for<'a>(&self, layers: impl IntoIterator<Item = &'a LayerId>) -> Option<f64> {
        layers
            .into_iter()
            .filter_map(|l| self.resolutions.get(l).and_then(|r| r.element_size))
            .min_by(f64::total_cmp)
    }

    /// Longest boundary segment for a region covered by `layers`.
    #[must_use]
    pub fn boundary_segment_for<'a>(&self, layers: impl IntoIterator<Item = &'a LayerId>) -> Option<f64> {
        layers
            .into_iter()
            .filter_map(|l| self.resolutions.get(l).and_then(|r| r.boundary_segment))
            .chain(self.max_boundary_segment)
            .min_by(f64::total_cmp)
    }
}

fn positive(parameter: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { parameter, value })
    }
}
