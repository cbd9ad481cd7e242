//! Immutable boosted-tree representation.
//!
//! A [`Tree`] is a flat node table (index 0 is the root) built from the
//! columnar arrays of a [`DecodedTree`]. Construction validates everything
//! the attribution code later relies on, so the traversal code can index
//! without further checks.

use super::node::Node;
use crate::core::constants::LEAF_CHILD_SENTINEL;
use crate::core::error::{ensure, Result, ShapError};
use crate::core::types::{FeatureVector, NodeIndex, Score};
use crate::io::model_file::DecodedTree;
use crate::malformed_model;

/// Tree structure for one member of a gradient-boosted ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    /// Node table, root at index 0
    nodes: Vec<Node>,
    /// Longest root-to-leaf path, in edges (a lone leaf has depth 0)
    max_depth: usize,
    /// One past the largest split feature index
    num_features_required: usize,
}

impl Tree {
    /// Build a tree from its decoded arrays.
    ///
    /// # Errors
    /// [`ShapError::MalformedModel`] when the declared node count is not a
    /// positive integer, an array is shorter than the node count, a child
    /// index is out of range or not adjacent (`right != left + 1`), a split
    /// feature is negative, or a node is reachable twice from the root.
    pub fn from_decoded(decoded: &DecodedTree) -> Result<Self> {
        let declared = &decoded.tree_param.num_nodes;
        let num_nodes = declared.as_count().ok_or_else(|| {
            malformed_model!("node count {} is not a non-negative integer", declared)
        })?;
        ensure!(num_nodes > 0, malformed_model!("tree declares no nodes"));

        check_len("base_weights", decoded.base_weights.len(), num_nodes)?;
        check_len("default_left", decoded.default_left.len(), num_nodes)?;
        check_len("left_children", decoded.left_children.len(), num_nodes)?;
        check_len("right_children", decoded.right_children.len(), num_nodes)?;
        check_len("split_conditions", decoded.split_conditions.len(), num_nodes)?;
        check_len("split_indices", decoded.split_indices.len(), num_nodes)?;
        check_len("sum_hessian", decoded.sum_hessian.len(), num_nodes)?;

        let mut nodes = Vec::with_capacity(num_nodes);
        for id in 0..num_nodes {
            let left = decoded.left_children[id];
            if left == LEAF_CHILD_SENTINEL {
                nodes.push(Node::new_leaf(
                    id,
                    decoded.base_weights[id],
                    decoded.sum_hessian[id],
                ));
                continue;
            }

            let right = decoded.right_children[id];
            let left = child_index(id, "left", left, num_nodes)?;
            let right = child_index(id, "right", right, num_nodes)?;
            ensure!(
                right == left + 1,
                malformed_model!(
                    "node {}: right child {} is not adjacent to left child {}",
                    id,
                    right,
                    left
                )
            );

            let feature = decoded.split_indices[id];
            let feature = usize::try_from(feature).map_err(|_| {
                malformed_model!("node {}: negative split feature {}", id, feature)
            })?;

            nodes.push(Node::new_internal(
                id,
                decoded.base_weights[id],
                feature,
                decoded.split_conditions[id],
                decoded.default_left[id] == 1,
                decoded.sum_hessian[id],
                left,
            ));
        }

        let (max_depth, num_features_required) = walk(&nodes)?;

        Ok(Tree {
            nodes,
            max_depth,
            num_features_required,
        })
    }

    /// The root node
    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// Node by id.
    ///
    /// # Panics
    /// If `id` is not a node of this tree.
    pub fn node(&self, id: NodeIndex) -> &Node {
        &self.nodes[id]
    }

    /// All nodes in id order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of nodes
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Longest root-to-leaf path in edges
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Minimum feature-vector length this tree can be evaluated on.
    pub fn num_features_required(&self) -> usize {
        self.num_features_required
    }

    /// Id of the leaf the feature vector routes to.
    pub fn leaf_index(&self, features: &FeatureVector) -> Result<NodeIndex> {
        ensure!(
            features.len() >= self.num_features_required,
            ShapError::invalid_feature_vector(self.num_features_required, features.len())
        );

        // leaves carry no split feature, so only internal nodes read one
        let mut id = 0;
        let mut node = self.root();
        while let Some((left, _)) = node.children() {
            id = node.route_from(left, features[node.split_feature()]);
            node = &self.nodes[id];
        }
        Ok(id)
    }

    /// The tree's output for a feature vector.
    pub fn predict(&self, features: &FeatureVector) -> Result<Score> {
        let leaf = self.leaf_index(features)?;
        Ok(self.nodes[leaf].leaf_value())
    }
}

fn check_len(name: &str, len: usize, num_nodes: usize) -> Result<()> {
    ensure!(
        len >= num_nodes,
        malformed_model!(
            "{} has {} entries but the tree declares {} nodes",
            name,
            len,
            num_nodes
        )
    );
    Ok(())
}

fn child_index(id: NodeIndex, side: &str, child: i64, num_nodes: usize) -> Result<NodeIndex> {
    usize::try_from(child)
        .ok()
        .filter(|&child| child < num_nodes)
        .ok_or_else(|| {
            malformed_model!(
                "node {}: {} child {} is out of range for {} nodes",
                id,
                side,
                child,
                num_nodes
            )
        })
}

/// Depth-first walk from the root: rejects shared nodes and cycles, and
/// measures depth and the feature range.
fn walk(nodes: &[Node]) -> Result<(usize, usize)> {
    let mut visited = vec![false; nodes.len()];
    let mut stack = vec![(0usize, 0usize)];
    let mut max_depth = 0;
    let mut num_features_required = 0;

    while let Some((id, depth)) = stack.pop() {
        ensure!(
            !visited[id],
            malformed_model!("node {} is reachable more than once from the root", id)
        );
        visited[id] = true;

        let node = &nodes[id];
        match node.children() {
            None => max_depth = max_depth.max(depth),
            Some((left, right)) => {
                num_features_required = num_features_required.max(node.split_feature() + 1);
                stack.push((right, depth + 1));
                stack.push((left, depth + 1));
            }
        }
    }

    let unreachable = visited.iter().filter(|&&seen| !seen).count();
    if unreachable > 0 {
        log::warn!(
            "{} of {} tree nodes are unreachable from the root",
            unreachable,
            nodes.len()
        );
    }

    Ok((max_depth, num_features_required))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::model_file::ModelInteger;

    fn two_level_tree() -> DecodedTree {
        DecodedTree::new()
            .split(1, 0, 0.5, true, 10.0)
            .split(3, 3, 1.0, false, 4.0)
            .leaf(-1.0, 6.0)
            .leaf(2.0, 1.0)
            .leaf(0.5, 3.0)
    }

    #[test]
    fn test_tree_construction() {
        let tree = Tree::from_decoded(&two_level_tree()).unwrap();
        assert_eq!(tree.num_nodes(), 5);
        assert_eq!(tree.max_depth(), 2);
        assert_eq!(tree.num_features_required(), 4);
        assert!(!tree.root().is_leaf());
        assert!(tree.node(2).is_leaf());
        assert_eq!(tree.node(1).children(), Some((3, 4)));
    }

    #[test]
    fn test_single_leaf_tree() {
        let tree = Tree::from_decoded(&DecodedTree::new().leaf(0.7, 3.0)).unwrap();
        assert_eq!(tree.max_depth(), 0);
        assert_eq!(tree.num_features_required(), 0);
        assert_eq!(tree.predict(&[]).unwrap(), 0.7);
        assert_eq!(tree.leaf_index(&[]).unwrap(), 0);
        assert_eq!(tree.predict(&[Some(4.0), None]).unwrap(), 0.7);
    }

    #[test]
    fn test_only_one_means_default_left() {
        let mut decoded = two_level_tree();
        decoded.default_left[0] = 2;
        let tree = Tree::from_decoded(&decoded).unwrap();
        assert!(!tree.root().default_left());
        assert_eq!(tree.leaf_index(&[None, None, None, None]).unwrap(), 2);

        decoded.default_left[0] = 1;
        let tree = Tree::from_decoded(&decoded).unwrap();
        assert!(tree.root().default_left());
    }

    #[test]
    fn test_prediction_routing() {
        let tree = Tree::from_decoded(&two_level_tree()).unwrap();
        let features = [Some(0.1), None, None, Some(2.0)];
        assert_eq!(tree.leaf_index(&features).unwrap(), 4);
        assert_eq!(tree.predict(&features).unwrap(), 0.5);

        let features = [None, None, None, None];
        assert_eq!(tree.leaf_index(&features).unwrap(), 4);

        let features = [Some(0.9), None, None, None];
        assert_eq!(tree.predict(&features).unwrap(), -1.0);
    }

    #[test]
    fn test_short_feature_vector() {
        let tree = Tree::from_decoded(&two_level_tree()).unwrap();
        let err = tree.predict(&[Some(0.1)]).unwrap_err();
        assert!(matches!(
            err,
            ShapError::InvalidFeatureVector {
                required: 4,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_bad_node_count() {
        for count in [
            ModelInteger::Text("abc".to_string()),
            ModelInteger::Text("-1".to_string()),
            ModelInteger::Integer(-2),
            ModelInteger::Integer(0),
        ] {
            let mut decoded = two_level_tree();
            decoded.tree_param.num_nodes = count;
            let err = Tree::from_decoded(&decoded).unwrap_err();
            assert_eq!(err.category(), "malformed_model");
        }
    }

    #[test]
    fn test_short_array() {
        let mut decoded = two_level_tree();
        decoded.sum_hessian.pop();
        let err = Tree::from_decoded(&decoded).unwrap_err();
        assert!(err.to_string().contains("sum_hessian"));
    }

    #[test]
    fn test_declared_count_smaller_than_arrays() {
        let mut decoded = DecodedTree::new().leaf(1.5, 2.0).leaf(9.0, 1.0);
        decoded.tree_param.num_nodes = ModelInteger::Integer(1);
        let tree = Tree::from_decoded(&decoded).unwrap();
        assert_eq!(tree.num_nodes(), 1);
    }

    #[test]
    fn test_child_out_of_range() {
        let mut decoded = two_level_tree();
        decoded.left_children[1] = 5;
        decoded.right_children[1] = 6;
        let err = Tree::from_decoded(&decoded).unwrap_err();
        assert!(err.to_string().contains("out of range"));

        let mut decoded = two_level_tree();
        decoded.left_children[0] = -3;
        let err = Tree::from_decoded(&decoded).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_non_adjacent_children() {
        let mut decoded = two_level_tree();
        decoded.right_children[0] = 3;
        let err = Tree::from_decoded(&decoded).unwrap_err();
        assert!(err.to_string().contains("not adjacent"));
    }

    #[test]
    fn test_negative_split_feature() {
        let mut decoded = two_level_tree();
        decoded.split_indices[1] = -1;
        let err = Tree::from_decoded(&decoded).unwrap_err();
        assert!(err.to_string().contains("negative split feature"));
    }

    #[test]
    fn test_cycle_is_rejected() {
        // node 1 points back at the root
        let mut decoded = two_level_tree();
        decoded.left_children[1] = 0;
        decoded.right_children[1] = 1;
        let err = Tree::from_decoded(&decoded).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_unreachable_nodes_are_tolerated() {
        let decoded = DecodedTree::new()
            .split(1, 0, 0.5, true, 2.0)
            .leaf(1.0, 1.0)
            .leaf(2.0, 1.0)
            .leaf(3.0, 1.0);
        let tree = Tree::from_decoded(&decoded).unwrap();
        assert_eq!(tree.num_nodes(), 4);
        assert_eq!(tree.max_depth(), 1);
    }
}
