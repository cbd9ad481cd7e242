//! Decoding of XGBoost JSON model files.
//!
//! Only the fields the attribution depends on are read. Everything is kept
//! in its columnar on-disk shape; turning it into a node graph, and
//! rejecting inconsistent arrays, is the job of [`crate::tree::Tree`].

use crate::core::error::Result;
use crate::core::types::Score;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// An integer that XGBoost writes either as a JSON number or as a string
/// (`"num_nodes": "7"`, `"best_ntree_limit": "120"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelInteger {
    /// A plain JSON number
    Integer(i64),
    /// A quoted integer
    Text(String),
}

impl ModelInteger {
    /// The value as a non-negative count, if it is one.
    pub fn as_count(&self) -> Option<usize> {
        match self {
            ModelInteger::Integer(value) => usize::try_from(*value).ok(),
            ModelInteger::Text(text) => text.trim().parse::<usize>().ok(),
        }
    }

    /// Whether the value carries no information at all (an empty string).
    pub fn is_blank(&self) -> bool {
        matches!(self, ModelInteger::Text(text) if text.trim().is_empty())
    }
}

impl Default for ModelInteger {
    fn default() -> Self {
        ModelInteger::Text(String::new())
    }
}

impl std::fmt::Display for ModelInteger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelInteger::Integer(value) => write!(f, "{}", value),
            ModelInteger::Text(text) => write!(f, "{:?}", text),
        }
    }
}

/// Per-tree parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeParam {
    /// Declared node count
    #[serde(default)]
    pub num_nodes: ModelInteger,
}

/// One tree as stored in the model file: parallel arrays indexed by node id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodedTree {
    /// Leaf value for leaves, base weight for internal nodes
    pub base_weights: Vec<Score>,
    /// Missing-value direction, 1 = left
    pub default_left: Vec<i32>,
    /// Left child ids, -1 for leaves
    pub left_children: Vec<i64>,
    /// Right child ids
    pub right_children: Vec<i64>,
    /// Split thresholds
    pub split_conditions: Vec<Score>,
    /// Split feature indices
    pub split_indices: Vec<i64>,
    /// Hessian sums
    pub sum_hessian: Vec<Score>,
    /// Tree parameters
    pub tree_param: TreeParam,
}

impl DecodedTree {
    /// Start an empty tree for programmatic construction.
    ///
    /// Nodes are appended in id order. A split's right child is always
    /// `left_child + 1`, matching the layout XGBoost writes.
    pub fn new() -> Self {
        Self {
            tree_param: TreeParam {
                num_nodes: ModelInteger::Integer(0),
            },
            ..Self::default()
        }
    }

    /// Append a leaf node
    pub fn leaf(self, value: Score, sum_hessian: Score) -> Self {
        self.push(value, false, -1, -1, 0.0, 0, sum_hessian)
    }

    /// Append an internal node routing `value < threshold` to `left_child`.
    pub fn split(
        self,
        left_child: usize,
        feature: usize,
        threshold: Score,
        default_left: bool,
        sum_hessian: Score,
    ) -> Self {
        let left = left_child as i64;
        self.push(
            0.0,
            default_left,
            left,
            left + 1,
            threshold,
            feature as i64,
            sum_hessian,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        mut self,
        base_weight: Score,
        default_left: bool,
        left: i64,
        right: i64,
        threshold: Score,
        feature: i64,
        sum_hessian: Score,
    ) -> Self {
        self.base_weights.push(base_weight);
        self.default_left.push(i32::from(default_left));
        self.left_children.push(left);
        self.right_children.push(right);
        self.split_conditions.push(threshold);
        self.split_indices.push(feature);
        self.sum_hessian.push(sum_hessian);
        self.tree_param.num_nodes = ModelInteger::Integer(self.base_weights.len() as i64);
        self
    }
}

#[derive(Debug, Deserialize)]
struct XgbModel {
    learner: Learner,
}

#[derive(Debug, Deserialize)]
struct Learner {
    #[serde(default)]
    attributes: Attributes,
    gradient_booster: GradientBooster,
}

#[derive(Debug, Default, Deserialize)]
struct Attributes {
    #[serde(default)]
    best_ntree_limit: Option<ModelInteger>,
}

#[derive(Debug, Deserialize)]
struct GradientBooster {
    model: BoosterModel,
}

#[derive(Debug, Deserialize)]
struct BoosterModel {
    #[serde(default)]
    trees: Vec<DecodedTree>,
}

/// A decoded ensemble: ordered trees plus the optional tree-count limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedEnsemble {
    /// Trees in boosting order
    pub trees: Vec<DecodedTree>,
    /// The model's `best_ntree_limit` attribute, if present
    pub best_ntree_limit: Option<ModelInteger>,
}

impl DecodedEnsemble {
    /// Assemble an ensemble from already-decoded trees.
    pub fn new(trees: Vec<DecodedTree>, best_ntree_limit: Option<usize>) -> Self {
        Self {
            trees,
            best_ntree_limit: best_ntree_limit.map(|limit| ModelInteger::Integer(limit as i64)),
        }
    }

    /// Decode an XGBoost JSON model document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let model: XgbModel = serde_json::from_str(json)?;
        Ok(Self::from_model(model))
    }

    /// Decode an XGBoost JSON model from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let model: XgbModel = serde_json::from_reader(reader)?;
        Ok(Self::from_model(model))
    }

    /// Decode an XGBoost JSON model file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Reading model file {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    fn from_model(model: XgbModel) -> Self {
        Self {
            trees: model.learner.gradient_booster.model.trees,
            best_ntree_limit: model.learner.attributes.best_ntree_limit,
        }
    }

    /// Number of trees in the ensemble
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// A copy holding only the first `num_trees` trees.
    pub fn truncated(&self, num_trees: usize) -> Self {
        Self {
            trees: self.trees.iter().take(num_trees).cloned().collect(),
            best_ntree_limit: self.best_ntree_limit.clone(),
        }
    }
}
