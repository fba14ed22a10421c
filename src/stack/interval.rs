use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A half-open vertical interval `[lo, hi)` with `lo < hi`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawInterval", into = "RawInterval")]
pub struct ZInterval {
    lo: f64,
    hi: f64,
}

#[derive(Serialize, Deserialize)]
struct RawInterval {
    lo: f64,
    hi: f64,
}

impl TryFrom<RawInterval> for ZInterval {
    type Error = ConfigError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Self::new(raw.lo, raw.hi).ok_or(ConfigError::InvalidParameter {
            parameter: "hi",
            value: raw.hi,
        })
    }
}

impl From<ZInterval> for RawInterval {
    fn from(interval: ZInterval) -> Self {
        Self {
            lo: interval.lo,
            hi: interval.hi,
        }
    }
}

impl ZInterval {
    /// Creates an interval, or `None` unless `lo < hi`.
    #[must_use]
    pub fn new(lo: f64, hi: f64) -> Option<Self> {
        (lo < hi).then_some(Self { lo, hi })
    }

    /// Callers guarantee `lo < hi`.
    pub(crate) fn from_ordered(lo: f64, hi: f64) -> Self {
        debug_assert!(lo < hi);
        Self { lo, hi }
    }

    #[must_use]
    pub fn lo(&self) -> f64 {
        self.lo
    }

    #[must_use]
    pub fn hi(&self) -> f64 {
        self.hi
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.hi - self.lo
    }

    #[must_use]
    pub fn contains(&self, z: f64) -> bool {
        self.lo <= z && z < self.hi
    }

    /// Common part of two intervals; touching intervals do not intersect.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        Self::new(self.lo.max(other.lo), self.hi.min(other.hi))
    }
}
