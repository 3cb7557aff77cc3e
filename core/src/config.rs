//! Tunable parameters for the ranking and link-analysis labs.

use crate::{LabError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BM25_K1: f64 = 1.5;
pub const DEFAULT_BM25_B: f64 = 0.75;
pub const DEFAULT_DAMPING: f64 = 0.85;
pub const DEFAULT_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// BM25 saturation (`k1`) and length-normalization (`b`) parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: DEFAULT_BM25_K1, b: DEFAULT_BM25_B }
    }
}

impl Bm25Params {
    pub fn new(k1: f64, b: f64) -> Result<Self> {
        let params = Self { k1, b };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.k1.is_finite() && self.k1 >= 0.0) {
            return Err(LabError::InvalidParameter { name: "k1", value: self.k1, range: "[0, inf)" });
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(LabError::InvalidParameter { name: "b", value: self.b, range: "[0, 1]" });
        }
        Ok(())
    }
}

/// Damping factor and stopping rule for PageRank power iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankConfig {
    pub damping: f64,
    /// Iteration stops once the L1 change of the rank vector drops below this.
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: DEFAULT_DAMPING,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl PageRankConfig {
    pub fn with_damping(damping: f64) -> Result<Self> {
        let config = Self { damping, ..Self::default() };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(LabError::InvalidParameter { name: "damping", value: self.damping, range: "[0, 1]" });
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(LabError::InvalidParameter { name: "tolerance", value: self.tolerance, range: "[0, inf)" });
        }
        Ok(())
    }
}
