//! Feature attribution for XGBoost ensembles.
//!
//! - [`mean_values`]: per-node expected values (the bias term)
//! - [`path`]: the TreeSHAP path ledger
//! - [`shap`]: the per-tree recursion, with optional conditioning
//! - [`predictor`]: ensemble-level contributions over a tree-count limit

pub mod mean_values;
pub mod path;
pub mod predictor;
pub mod shap;

pub use mean_values::NodeMeanValues;
pub use path::PathElement;
pub use predictor::Predictor;
pub use shap::{tree_contributions, Condition};
