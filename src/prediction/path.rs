//! The TreeSHAP path ledger.
//!
//! A path holds one element per distinct split feature between the root and
//! the node being visited. `pweight[i]` is the weight of the subsets of size
//! `i` of the path's features; extending and unwinding keep those weights
//! consistent in O(depth) so that a leaf's Shapley contributions cost
//! O(depth^2) instead of an exponential subset sum.
//!
//! All arithmetic is single precision and the operation order below is part
//! of the contract: results are reproducible bit for bit only if it is kept.

use crate::core::error::{Result, ShapError};
use crate::core::types::{FeatureIndex, Score};

/// Path element for SHAP value computation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PathElement {
    /// Split feature, `None` for the root's own element
    pub feature_index: Option<FeatureIndex>,
    /// Fraction of the "feature absent" flow reaching this point
    pub zero_fraction: Score,
    /// 1 if the actual value follows this path, 0 otherwise
    pub one_fraction: Score,
    /// Permutation weight for subsets of size equal to this slot's position
    pub pweight: Score,
}

/// Append an element at `unique_depth` and update the permutation weights.
pub fn extend_path(
    unique_path: &mut [PathElement],
    unique_depth: usize,
    zero_fraction: Score,
    one_fraction: Score,
    feature_index: Option<FeatureIndex>,
) {
    unique_path[unique_depth] = PathElement {
        feature_index,
        zero_fraction,
        one_fraction,
        pweight: if unique_depth == 0 { 1.0 } else { 0.0 },
    };

    let depth_plus_one = (unique_depth + 1) as Score;
    for i in (0..unique_depth).rev() {
        unique_path[i + 1].pweight +=
            one_fraction * unique_path[i].pweight * (i + 1) as Score / depth_plus_one;
        unique_path[i].pweight =
            zero_fraction * unique_path[i].pweight * (unique_depth - i) as Score / depth_plus_one;
    }
}

/// Remove the element at `path_index`, undoing its extension.
///
/// # Errors
/// [`ShapError::AlgorithmInvariantViolation`] if the element carries no
/// flow at all (both fractions zero) while some weight is non-zero.
pub fn unwind_path(
    unique_path: &mut [PathElement],
    unique_depth: usize,
    path_index: usize,
) -> Result<()> {
    let one_fraction = unique_path[path_index].one_fraction;
    let zero_fraction = unique_path[path_index].zero_fraction;
    let mut next_one_portion = unique_path[unique_depth].pweight;
    let depth_plus_one = (unique_depth + 1) as Score;

    for i in (0..unique_depth).rev() {
        if one_fraction != 0.0 {
            let tmp = unique_path[i].pweight;
            unique_path[i].pweight =
                next_one_portion * depth_plus_one / ((i + 1) as Score * one_fraction);
            next_one_portion = tmp
                - unique_path[i].pweight * zero_fraction * (unique_depth - i) as Score
                    / depth_plus_one;
        } else if zero_fraction != 0.0 {
            unique_path[i].pweight = (unique_path[i].pweight * depth_plus_one)
                / (zero_fraction * (unique_depth - i) as Score);
        } else if unique_path[i].pweight != 0.0 {
            return Err(non_zero_weight(i, unique_path[i].pweight));
        }
    }

    for i in path_index..unique_depth {
        unique_path[i].feature_index = unique_path[i + 1].feature_index;
        unique_path[i].zero_fraction = unique_path[i + 1].zero_fraction;
        unique_path[i].one_fraction = unique_path[i + 1].one_fraction;
    }
    Ok(())
}

/// Total permutation weight the path would have if the element at
/// `path_index` were unwound. Does not modify the path.
///
/// # Errors
/// [`ShapError::AlgorithmInvariantViolation`] if the element carries no
/// flow at all (both fractions zero) while some weight is non-zero.
pub fn unwound_path_sum(
    unique_path: &[PathElement],
    unique_depth: usize,
    path_index: usize,
) -> Result<Score> {
    let one_fraction = unique_path[path_index].one_fraction;
    let zero_fraction = unique_path[path_index].zero_fraction;
    let mut next_one_portion = unique_path[unique_depth].pweight;
    let depth_plus_one = (unique_depth + 1) as Score;
    let mut total = 0.0;

    for i in (0..unique_depth).rev() {
        if one_fraction != 0.0 {
            let tmp = next_one_portion * depth_plus_one / ((i + 1) as Score * one_fraction);
            total += tmp;
            next_one_portion = unique_path[i].pweight
                - tmp * zero_fraction * ((unique_depth - i) as Score / depth_plus_one);
        } else if zero_fraction != 0.0 {
            total += (unique_path[i].pweight / zero_fraction)
                / ((unique_depth - i) as Score / depth_plus_one);
        } else if unique_path[i].pweight != 0.0 {
            return Err(non_zero_weight(i, unique_path[i].pweight));
        }
    }

    Ok(total)
}

fn non_zero_weight(slot: usize, pweight: Score) -> ShapError {
    ShapError::invariant_violation(format!(
        "path slot {} must have zero weight, found {}",
        slot, pweight
    ))
}
