//! Layer stack: vertical extent, material and meshing priority per layer.

mod interval;
mod load;

pub use interval::ZInterval;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::LayerTag;
use crate::math::Normalizer;

/// Name of a fabrication layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for LayerId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// One layer of the stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEntry", into = "RawEntry")]
pub struct LayerStackEntry {
    layer: LayerId,
    material: String,
    z_min: f64,
    z_max: f64,
    mesh_order: Option<i32>,
}

#[derive(Serialize, Deserialize)]
struct RawEntry {
    layer: LayerId,
    material: String,
    z_min: f64,
    z_max: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mesh_order: Option<i32>,
}

impl TryFrom<RawEntry> for LayerStackEntry {
    type Error = ConfigError;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        let entry = Self::new(raw.layer, raw.material, raw.z_min, raw.z_max)?;
        Ok(match raw.mesh_order {
            Some(order) => entry.with_mesh_order(order),
            None => entry,
        })
    }
}

impl From<LayerStackEntry> for RawEntry {
    fn from(entry: LayerStackEntry) -> Self {
        Self {
            layer: entry.layer,
            material: entry.material,
            z_min: entry.z_min,
            z_max: entry.z_max,
            mesh_order: entry.mesh_order,
        }
    }
}

impl LayerStackEntry {
    /// Creates an entry spanning `[z_min, z_max)`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidZRange`] unless `z_min < z_max` and both
    /// are finite.
    pub fn new(
        layer: impl Into<LayerId>,
        material: impl Into<String>,
        z_min: f64,
        z_max: f64,
    ) -> Result<Self, ConfigError> {
        let layer = layer.into();
        if !z_min.is_finite() || !z_max.is_finite() || z_min >= z_max {
            return Err(ConfigError::InvalidZRange { layer, z_min, z_max });
        }
        Ok(Self {
            layer,
            material: material.into(),
            z_min,
            z_max,
            mesh_order: None,
        })
    }

    /// Declares a meshing priority (lower wins).
    #[must_use]
    pub fn with_mesh_order(mut self, mesh_order: i32) -> Self {
        self.mesh_order = Some(mesh_order);
        self
    }

    #[must_use]
    pub fn layer(&self) -> &LayerId {
        &self.layer
    }

    #[must_use]
    pub fn material(&self) -> &str {
        &self.material
    }

    #[must_use]
    pub fn z_min(&self) -> f64 {
        self.z_min
    }

    #[must_use]
    pub fn z_max(&self) -> f64 {
        self.z_max
    }

    #[must_use]
    pub fn mesh_order(&self) -> Option<i32> {
        self.mesh_order
    }

    /// `[z_min, z_max)` snapped to the grid of `normalizer`, or `None` when
    /// the layer is thinner than one cell.
    #[must_use]
    pub fn interval(&self, normalizer: &Normalizer) -> Option<ZInterval> {
        ZInterval::new(normalizer.snap(self.z_min), normalizer.snap(self.z_max))
    }

    /// Half-open membership on the grid: present at `z_min`, absent at
    /// `z_max`.
    #[must_use]
    pub fn contains_z(&self, z: f64, normalizer: &Normalizer) -> bool {
        let k = normalizer.grid_index(z);
        normalizer.grid_index(self.z_min) <= k && k < normalizer.grid_index(self.z_max)
    }

    /// The label polygons of this layer carry through a build.
    #[must_use]
    pub fn tag(&self) -> LayerTag {
        LayerTag {
            layer: self.layer.clone(),
            material: self.material.clone(),
            mesh_order: self.mesh_order,
        }
    }
}

/// The set of layers with their vertical extents.
///
/// Input order carries no meaning; every query returns a canonical order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStack", into = "RawStack")]
pub struct LayerStack {
    entries: Vec<LayerStackEntry>,
}

#[derive(Serialize, Deserialize)]
struct RawStack {
    layers: Vec<LayerStackEntry>,
}

impl TryFrom<RawStack> for LayerStack {
    type Error = ConfigError;

    fn try_from(raw: RawStack) -> Result<Self, Self::Error> {
        Self::new(raw.layers)
    }
}

impl From<LayerStack> for RawStack {
    fn from(stack: LayerStack) -> Self {
        Self {
            layers: stack.entries,
        }
    }
}

impl LayerStack {
    /// Creates a stack from entries with unique layer ids.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateLayer`] if a layer id repeats.
    pub fn new(entries: Vec<LayerStackEntry>) -> Result<Self, ConfigError> {
        let mut seen = BTreeSet::new();
        for entry in &entries {
            if !seen.insert(entry.layer.clone()) {
                return Err(ConfigError::DuplicateLayer(entry.layer.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// Entries in input order.
    #[must_use]
    pub fn entries(&self) -> &[LayerStackEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entry(&self, layer: &LayerId) -> Option<&LayerStackEntry> {
        self.entries.iter().find(|e| &e.layer == layer)
    }

    /// Build label of `layer`, if the stack has it.
    #[must_use]
    pub fn tag(&self, layer: &LayerId) -> Option<LayerTag> {
        self.entry(layer).map(LayerStackEntry::tag)
    }

    /// Entries sorted by `z_min`, then `z_max`, then layer id.
    #[must_use]
    pub fn ordered(&self) -> Vec<&LayerStackEntry> {
        let mut out: Vec<_> = self.entries.iter().collect();
        out.sort_by(|a, b| {
            a.z_min
                .total_cmp(&b.z_min)
                .then(a.z_max.total_cmp(&b.z_max))
                .then_with(|| a.layer.cmp(&b.layer))
        });
        out
    }

    /// Entries sorted by declared mesh order (undeclared last), then as in
    /// [`ordered`](Self::ordered).
    #[must_use]
    pub fn by_mesh_order(&self) -> Vec<&LayerStackEntry> {
        let mut out = self.ordered();
        // Stable sort keeps the z order among equal priorities.
        out.sort_by_key(|e| (e.mesh_order.is_none(), e.mesh_order));
        out
    }

    /// All distinct `z_min`/`z_max` values, snapped by `normalizer`, ascending.
    #[must_use]
    pub fn unique_z(&self, normalizer: &Normalizer) -> Vec<f64> {
        let keys: BTreeSet<i64> = self
            .entries
            .iter()
            .flat_map(|e| [e.z_min, e.z_max])
            .map(|z| normalizer.grid_index(z))
            .collect();
        keys.into_iter().map(|k| normalizer.from_grid_index(k)).collect()
    }

    /// For each layer, the unique stack z values inside its closed z range.
    #[must_use]
    pub fn map_unique_z(&self, normalizer: &Normalizer) -> BTreeMap<LayerId, Vec<f64>> {
        let unique = self.unique_z(normalizer);
        self.entries
            .iter()
            .map(|e| {
                let lo = normalizer.snap(e.z_min);
                let hi = normalizer.snap(e.z_max);
                let zs = unique.iter().copied().filter(|&z| lo <= z && z <= hi).collect();
                (e.layer.clone(), zs)
            })
            .collect()
    }

    /// Maximal intervals over which the set of present layers is constant.
    ///
    /// Intervals with no layer present (gaps in the stack) are omitted.
    #[must_use]
    pub fn z_intervals(&self, normalizer: &Normalizer) -> Vec<(ZInterval, BTreeSet<LayerId>)> {
        let unique = self.unique_z(normalizer);
        let mut out: Vec<(ZInterval, BTreeSet<LayerId>)> = Vec::new();
        for w in unique.windows(2) {
            let (lo, hi) = (w[0], w[1]);
            let mid = 0.5 * (lo + hi);
            let present: BTreeSet<LayerId> = self
                .entries
                .iter()
                .filter(|e| normalizer.snap(e.z_min) <= mid && mid < normalizer.snap(e.z_max))
                .map(|e| e.layer.clone())
                .collect();
            if present.is_empty() {
                continue;
            }
            match out.last_mut() {
                Some((last, layers)) if *layers == present && last.hi() == lo => {
                    *last = ZInterval::from_ordered(last.lo(), hi);
                }
                _ => out.push((ZInterval::from_ordered(lo, hi), present)),
            }
        }
        out
    }

    /// Layers present at `z` (half-open ranges, compared on the grid).
    #[must_use]
    pub fn layers_at(&self, z: f64, normalizer: &Normalizer) -> BTreeSet<LayerId> {
        self.entries
            .iter()
            .filter(|e| e.contains_z(z, normalizer))
            .map(|e| e.layer.clone())
            .collect()
    }

    /// Entries present at `z`, in [`ordered`](Self::ordered) order.
    #[must_use]
    pub fn entries_at(&self, z: f64, normalizer: &Normalizer) -> Vec<&LayerStackEntry> {
        self.ordered()
            .into_iter()
            .filter(|e| e.contains_z(z, normalizer))
            .collect()
    }

    /// Vertical overlap of every pair of distinct layers whose snapped ranges
    /// share more than a boundary. Both `(a, b)` and `(b, a)` are present.
    #[must_use]
    pub fn overlaps(&self, normalizer: &Normalizer) -> BTreeMap<(LayerId, LayerId), ZInterval> {
        let mut out = BTreeMap::new();
        for (i, a) in self.entries.iter().enumerate() {
            for b in &self.entries[i + 1..] {
                if let Some(interval) = snapped_overlap(a, b, normalizer) {
                    out.insert((a.layer.clone(), b.layer.clone()), interval);
                    out.insert((b.layer.clone(), a.layer.clone()), interval);
                }
            }
        }
        out
    }

    /// Vertical overlap of two layers, if any.
    #[must_use]
    pub fn overlap(&self, a: &LayerId, b: &LayerId, normalizer: &Normalizer) -> Option<ZInterval> {
        snapped_overlap(self.entry(a)?, self.entry(b)?, normalizer)
    }

    /// Full z extent of the stack.
    #[must_use]
    pub fn z_extent(&self) -> Option<ZInterval> {
        let lo = self.entries.iter().map(|e| e.z_min).min_by(f64::total_cmp)?;
        let hi = self.entries.iter().map(|e| e.z_max).max_by(f64::total_cmp)?;
        Some(ZInterval::from_ordered(lo, hi))
    }
}

fn snapped_overlap(
    a: &LayerStackEntry,
    b: &LayerStackEntry,
    normalizer: &Normalizer,
) -> Option<ZInterval> {
    a.interval(normalizer)?.intersection(&b.interval(normalizer)?)
}
