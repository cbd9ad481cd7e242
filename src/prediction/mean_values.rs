//! Per-node expected values.
//!
//! The mean value of a node is the hessian-weighted average of the leaf
//! values below it. The root's mean value is the tree's contribution to the
//! bias term of every contribution vector.

use crate::core::error::{Result, ShapError};
use crate::core::types::{NodeIndex, Score};
use crate::tree::Tree;

/// Mean value of every node of one tree, indexed by node id.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMeanValues {
    values: Vec<Score>,
}

impl NodeMeanValues {
    /// Compute the table for a tree.
    ///
    /// # Errors
    /// [`ShapError::MalformedModel`] if an internal node has a zero hessian
    /// sum, since its children's weights would be undefined.
    pub fn compute(tree: &Tree) -> Result<Self> {
        let mut values = vec![0.0; tree.num_nodes()];
        fill_node_mean_values(tree, 0, &mut values)?;
        Ok(Self { values })
    }

    /// The root's mean value: the tree's expected output.
    pub fn root(&self) -> Score {
        self.values[0]
    }

    /// Mean value of a node
    pub fn get(&self, id: NodeIndex) -> Option<Score> {
        self.values.get(id).copied()
    }

    /// The whole table
    pub fn as_slice(&self) -> &[Score] {
        &self.values
    }
}

fn fill_node_mean_values(tree: &Tree, id: NodeIndex, values: &mut [Score]) -> Result<Score> {
    let node = tree.node(id);
    let result = match node.children() {
        None => node.leaf_value(),
        Some((left, right)) => {
            if node.sum_hessian() == 0.0 {
                return Err(ShapError::malformed_model(format!(
                    "node {} has a zero hessian sum",
                    id
                )));
            }
            let mut result = fill_node_mean_values(tree, left, values)? * tree.node(left).sum_hessian();
            result += fill_node_mean_values(tree, right, values)? * tree.node(right).sum_hessian();
            result / node.sum_hessian()
        }
    };
    values[id] = result;
    Ok(result)
}
