//! Path-dependent TreeSHAP for a single tree.
//!
//! One depth-first walk per tree and feature vector. The walk follows the
//! "hot" child (where the feature vector actually goes) and the "cold"
//! child (where it would go if the split feature were unknown), keeping the
//! path ledger in one preallocated buffer: each call works on the window
//! that starts one slot past its parent's copy of the path.

use super::mean_values::NodeMeanValues;
use super::path::{extend_path, unwind_path, unwound_path_sum, PathElement};
use crate::core::constants::path_buffer_len;
use crate::core::error::{Result, ShapError};
use crate::core::types::{FeatureIndex, FeatureVector, NodeIndex, Score};
use crate::tree::Tree;
use serde::{Deserialize, Serialize};

/// Single-feature conditioning, the building block of SHAP interaction
/// values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    /// Plain Shapley values; the bias term is included
    #[default]
    Unconditioned,
    /// Contributions with the feature always following its actual value
    Present(FeatureIndex),
    /// Contributions with the feature always treated as unknown
    Absent(FeatureIndex),
}

impl Condition {
    /// The conditioned feature, if any
    pub fn feature(&self) -> Option<FeatureIndex> {
        match self {
            Condition::Unconditioned => None,
            Condition::Present(feature) | Condition::Absent(feature) => Some(*feature),
        }
    }
}

/// Add one tree's contributions for `features` into `phi`.
///
/// `phi` must hold `features.len() + 1` slots; the last one receives the
/// tree's expected value when unconditioned.
pub fn tree_contributions(
    tree: &Tree,
    mean_values: &NodeMeanValues,
    features: &FeatureVector,
    condition: Condition,
    phi: &mut [Score],
) -> Result<()> {
    if features.len() < tree.num_features_required() {
        return Err(ShapError::invalid_feature_vector(
            tree.num_features_required(),
            features.len(),
        ));
    }
    if phi.len() != features.len() + 1 {
        return Err(ShapError::invariant_violation(format!(
            "contribution buffer has {} slots for {} features",
            phi.len(),
            features.len()
        )));
    }

    if condition == Condition::Unconditioned {
        phi[features.len()] += mean_values.root();
    }

    let mut unique_path_data = vec![PathElement::default(); path_buffer_len(tree.max_depth())];
    let walker = TreeShap {
        tree,
        features,
        condition,
    };
    walker.recurse(phi, 0, 0, &mut unique_path_data, 1.0, 1.0, None, 1.0)
}

struct TreeShap<'a> {
    tree: &'a Tree,
    features: &'a FeatureVector,
    condition: Condition,
}

impl TreeShap<'_> {
    #[allow(clippy::too_many_arguments)]
    fn recurse(
        &self,
        phi: &mut [Score],
        node_index: NodeIndex,
        unique_depth: usize,
        parent_unique_path: &mut [PathElement],
        parent_zero_fraction: Score,
        parent_one_fraction: Score,
        parent_feature_index: Option<FeatureIndex>,
        condition_fraction: Score,
    ) -> Result<()> {
        // no flow reaches this node
        if condition_fraction == 0.0 {
            return Ok(());
        }

        if parent_unique_path.len() < 2 * (unique_depth + 1) {
            return Err(ShapError::invariant_violation(format!(
                "path buffer exhausted at node {} (depth {})",
                node_index, unique_depth
            )));
        }
        let (parent_path, unique_path) = parent_unique_path.split_at_mut(unique_depth + 1);
        unique_path[..=unique_depth].copy_from_slice(parent_path);

        let conditioned_feature = self.condition.feature();
        if conditioned_feature.is_none() || conditioned_feature != parent_feature_index {
            extend_path(
                unique_path,
                unique_depth,
                parent_zero_fraction,
                parent_one_fraction,
                parent_feature_index,
            );
        }

        let node = self.tree.node(node_index);
        let Some((left, right)) = node.children() else {
            let leaf_value = node.leaf_value();
            for i in 1..=unique_depth {
                let w = unwound_path_sum(unique_path, unique_depth, i)?;
                let element = &unique_path[i];
                let feature = element.feature_index.ok_or_else(|| {
                    ShapError::invariant_violation(format!("path slot {} has no feature", i))
                })?;
                phi[feature] += w
                    * (element.one_fraction - element.zero_fraction)
                    * leaf_value
                    * condition_fraction;
            }
            return Ok(());
        };

        let split_index = node.split_feature();
        let hot_index = node.route_from(left, self.features[split_index]);
        let cold_index = if hot_index == left { right } else { left };

        let w = node.sum_hessian();
        let hot_zero_fraction = self.tree.node(hot_index).sum_hessian() / w;
        let cold_zero_fraction = self.tree.node(cold_index).sum_hessian() / w;
        let mut incoming_zero_fraction = 1.0;
        let mut incoming_one_fraction = 1.0;
        let mut child_depth = unique_depth + 1;

        // a feature split on again further down is unwound and re-extended
        if let Some(path_index) =
            (0..=unique_depth).find(|&i| unique_path[i].feature_index == Some(split_index))
        {
            incoming_zero_fraction = unique_path[path_index].zero_fraction;
            incoming_one_fraction = unique_path[path_index].one_fraction;
            unwind_path(unique_path, unique_depth, path_index)?;
            child_depth -= 1;
        }

        let mut hot_condition_fraction = condition_fraction;
        let mut cold_condition_fraction = condition_fraction;
        match self.condition {
            Condition::Present(feature) if feature == split_index => {
                cold_condition_fraction = 0.0;
                child_depth -= 1;
            }
            Condition::Absent(feature) if feature == split_index => {
                hot_condition_fraction *= hot_zero_fraction;
                cold_condition_fraction *= cold_zero_fraction;
                child_depth -= 1;
            }
            _ => {}
        }

        self.recurse(
            phi,
            hot_index,
            child_depth,
            unique_path,
            hot_zero_fraction * incoming_zero_fraction,
            incoming_one_fraction,
            Some(split_index),
            hot_condition_fraction,
        )?;

        self.recurse(
            phi,
            cold_index,
            child_depth,
            unique_path,
            cold_zero_fraction * incoming_zero_fraction,
            0.0,
            Some(split_index),
            cold_condition_fraction,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::model_file::DecodedTree;
    use approx::assert_relative_eq;

    fn stump() -> Tree {
        Tree::from_decoded(
            &DecodedTree::new()
                .split(1, 0, 0.5, true, 10.0)
                .leaf(1.0, 4.0)
                .leaf(-1.0, 6.0),
        )
        .unwrap()
    }

    fn contributions(tree: &Tree, features: &FeatureVector, condition: Condition) -> Vec<Score> {
        let means = NodeMeanValues::compute(tree).unwrap();
        let mut phi = vec![0.0; features.len() + 1];
        tree_contributions(tree, &means, features, condition, &mut phi).unwrap();
        phi
    }

    #[test]
    fn test_stump_contributions() {
        let tree = stump();
        let phi = contributions(&tree, &[Some(0.0), Some(9.0)], Condition::Unconditioned);
        assert_relative_eq!(phi[0], 1.2, epsilon = 1e-6);
        assert_eq!(phi[1], 0.0);
        assert_relative_eq!(phi[2], -0.2, epsilon = 1e-6);

        let phi = contributions(&tree, &[Some(0.7), None], Condition::Unconditioned);
        assert_relative_eq!(phi[0], -0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_missing_value_uses_default_direction() {
        let tree = stump();
        let missing = contributions(&tree, &[None], Condition::Unconditioned);
        let left = contributions(&tree, &[Some(0.0)], Condition::Unconditioned);
        assert_eq!(missing, left);
    }

    #[test]
    fn test_single_leaf_only_feeds_bias() {
        let tree = Tree::from_decoded(&DecodedTree::new().leaf(0.42, 1.0)).unwrap();
        let phi = contributions(&tree, &[Some(1.0), None, Some(3.0)], Condition::Unconditioned);
        assert_eq!(phi, vec![0.0, 0.0, 0.0, 0.42]);
    }

    #[test]
    fn test_conditioning_skips_bias() {
        let tree = stump();
        let features = [Some(0.0), Some(1.0)];
        let plain = contributions(&tree, &features, Condition::Unconditioned);
        let conditioned = contributions(&tree, &features, Condition::Present(1));
        assert_eq!(conditioned[0], plain[0]);
        assert_eq!(conditioned[2], 0.0);
    }

    #[test]
    fn test_conditioning_on_split_feature() {
        let tree = stump();
        let features = [Some(0.0)];
        // the only split feature is conditioned away, so nothing is attributed
        let present = contributions(&tree, &features, Condition::Present(0));
        assert_eq!(present, vec![0.0, 0.0]);
        let absent = contributions(&tree, &features, Condition::Absent(0));
        assert_eq!(absent, vec![0.0, 0.0]);
    }

    #[test]
    fn test_rejects_short_feature_vector() {
        let tree = stump();
        let means = NodeMeanValues::compute(&tree).unwrap();
        let mut phi = vec![0.0; 1];
        let err = tree_contributions(&tree, &means, &[], Condition::Unconditioned, &mut phi)
            .unwrap_err();
        assert!(matches!(err, ShapError::InvalidFeatureVector { .. }));
    }

    #[test]
    fn test_condition_feature() {
        assert_eq!(Condition::Unconditioned.feature(), None);
        assert_eq!(Condition::Present(3).feature(), Some(3));
        assert_eq!(Condition::Absent(1).feature(), Some(1));
        assert_eq!(Condition::default(), Condition::Unconditioned);
    }
}
