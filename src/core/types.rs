//! Core data types for xgb-shap.

/// Prediction and contribution value type. The whole attribution pipeline
/// runs in single precision.
pub type Score = f32;

/// Feature index type for identifying features in the input vector.
pub type FeatureIndex = usize;

/// Tree node identifier type (index into a tree's node table).
pub type NodeIndex = usize;

/// One input row: `None` marks a missing value, routed through the
/// node's default direction.
pub type FeatureVector = [Option<Score>];

/// Per-feature contributions followed by one trailing bias slot.
pub type ContributionVector = Vec<Score>;

/// Convert a dense row where `NaN` marks a missing value into the
/// optional representation used by the predictor.
pub fn nan_as_missing(row: impl IntoIterator<Item = Score>) -> Vec<Option<Score>> {
    row.into_iter()
        .map(|value| if value.is_nan() { None } else { Some(value) })
        .collect()
}
