//! Predictor configuration.
//!
//! The attribution itself is fully determined by the model; the only knob
//! that changes results is the tree-count limit. The additivity check is a
//! diagnostic that only logs.

use crate::core::constants::DEFAULT_ADDITIVITY_TOLERANCE;
use serde::{Deserialize, Serialize};

/// Configuration for a [`crate::prediction::Predictor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Number of leading trees to use. `None` (or `Some(0)`) defers to the
    /// model's `best_ntree_limit` attribute.
    pub ntree_limit: Option<usize>,
    /// Compare each contribution sum against the ensemble margin and log a
    /// warning on mismatch.
    pub check_additivity: bool,
    /// Absolute tolerance for the additivity check
    pub additivity_tolerance: f32,
}

impl PredictorConfig {
    /// Create a new predictor configuration with defaults
    pub fn new() -> Self {
        Self {
            ntree_limit: None,
            check_additivity: false,
            additivity_tolerance: DEFAULT_ADDITIVITY_TOLERANCE,
        }
    }

    /// Override the model's tree-count limit
    pub fn with_ntree_limit(mut self, ntree_limit: Option<usize>) -> Self {
        self.ntree_limit = ntree_limit;
        self
    }

    /// Enable or disable the additivity check
    pub fn with_additivity_check(mut self, enabled: bool) -> Self {
        self.check_additivity = enabled;
        self
    }

    /// Set the additivity check tolerance
    pub fn with_additivity_tolerance(mut self, tolerance: f32) -> Self {
        self.additivity_tolerance = tolerance;
        self
    }

    /// The explicit override, with 0 treated as "not set".
    pub fn explicit_ntree_limit(&self) -> Option<usize> {
        self.ntree_limit.filter(|&limit| limit > 0)
    }
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self::new()
    }
}
