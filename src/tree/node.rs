//! Tree node representation.
//!
//! A node is either a leaf (no children) or an internal node with exactly
//! two children whose ids are adjacent: `right == left + 1`.

use crate::core::types::{FeatureIndex, NodeIndex, Score};

/// One node of a boosted tree, addressed by its id in the tree's node table.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Index of this node in its tree
    id: NodeIndex,
    /// Leaf value for leaves, base weight for internal nodes
    base_weight: Score,
    /// Split feature (meaningless for leaves)
    split_feature: FeatureIndex,
    /// Split threshold: values strictly below it go left
    split_threshold: Score,
    /// Direction taken when the split feature is missing
    default_left: bool,
    /// Hessian sum of the training samples routed through this node
    sum_hessian: Score,
    /// Left child id; the right child is always `left + 1`
    left_child: Option<NodeIndex>,
}

impl Node {
    /// Creates a leaf node.
    pub fn new_leaf(id: NodeIndex, value: Score, sum_hessian: Score) -> Self {
        Node {
            id,
            base_weight: value,
            split_feature: 0,
            split_threshold: 0.0,
            default_left: false,
            sum_hessian,
            left_child: None,
        }
    }

    /// Creates an internal node. The right child is `left_child + 1`.
    pub fn new_internal(
        id: NodeIndex,
        base_weight: Score,
        split_feature: FeatureIndex,
        split_threshold: Score,
        default_left: bool,
        sum_hessian: Score,
        left_child: NodeIndex,
    ) -> Self {
        Node {
            id,
            base_weight,
            split_feature,
            split_threshold,
            default_left,
            sum_hessian,
            left_child: Some(left_child),
        }
    }

    /// Node id
    pub fn id(&self) -> NodeIndex {
        self.id
    }

    /// Whether this node has no children
    pub fn is_leaf(&self) -> bool {
        self.left_child.is_none()
    }

    /// The value a tree emits when routing ends here.
    pub fn leaf_value(&self) -> Score {
        self.base_weight
    }

    /// Base weight (same storage as the leaf value)
    pub fn base_weight(&self) -> Score {
        self.base_weight
    }

    /// Split feature index
    pub fn split_feature(&self) -> FeatureIndex {
        self.split_feature
    }

    /// Split threshold
    pub fn split_threshold(&self) -> Score {
        self.split_threshold
    }

    /// Missing-value direction
    pub fn default_left(&self) -> bool {
        self.default_left
    }

    /// Hessian sum
    pub fn sum_hessian(&self) -> Score {
        self.sum_hessian
    }

    /// `(left, right)` child ids, `None` for leaves.
    pub fn children(&self) -> Option<(NodeIndex, NodeIndex)> {
        self.left_child.map(|left| (left, left + 1))
    }

    /// The child a feature value routes to, `None` for leaves.
    pub fn next_child(&self, value: Option<Score>) -> Option<NodeIndex> {
        self.left_child.map(|left| self.route_from(left, value))
    }

    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub(crate) fn route_from(&self, left: NodeIndex, value: Option<Score>) -> NodeIndex {
        match value {
            None if self.default_left => left,
            None => left + 1,
            Some(value) => {
                let mut next = left;
                if !(value < self.split_threshold) {
                    next += 1;
                }
                next
            }
        }
    }
}
