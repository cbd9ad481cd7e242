//! # xgb-shap
//!
//! Exact TreeSHAP feature contributions for XGBoost tree ensembles, in
//! pure Rust.
//!
//! Given a model exported by XGBoost as JSON and one feature vector, the
//! [`Predictor`] returns one Shapley value per feature plus a trailing bias
//! term. The values add up to the model's raw margin for that vector, and
//! match XGBoost's own `pred_contribs` output: the attribution runs in
//! single precision with the same operation order.
//!
//! ## Features
//!
//! - **Path-dependent TreeSHAP**: polynomial-time exact Shapley values using
//!   the training hessians stored in the model as cover.
//! - **Missing values**: `None` entries follow each split's default
//!   direction, exactly as at prediction time.
//! - **Conditioning**: contributions with one feature forced present or
//!   absent, the building block of interaction values.
//! - **Parallel batches**: the predictor is immutable and `Send + Sync`;
//!   batch and matrix entry points fan rows out with Rayon.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xgb_shap::{Predictor, PredictorConfig};
//!
//! # fn main() -> xgb_shap::Result<()> {
//! let predictor = Predictor::from_json_file("model.json", PredictorConfig::default())?;
//!
//! let features = vec![Some(0.5), None, Some(3.25)];
//! let contributions = predictor.predict_contributions(&features)?;
//!
//! let (per_feature, bias) = contributions.split_at(features.len());
//! println!("bias {} contributions {:?}", bias[0], per_feature);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`core`]: scalar types, constants and the [`ShapError`] type
//! - [`config`]: [`PredictorConfig`]
//! - [`io`]: XGBoost JSON model decoding and CSV feature loading
//! - [`tree`]: validated, immutable tree representation
//! - [`prediction`]: mean values, path ledger, TreeSHAP and the predictor

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    non_snake_case,
    non_upper_case_globals
)]

// Core infrastructure module - always available
pub mod core;

// Configuration management module
pub mod config;

// Model and feature decoding
pub mod io;

// Tree representation
pub mod tree;

// Attribution
pub mod prediction;

pub use crate::config::PredictorConfig;
pub use crate::core::error::{Result, ShapError};
pub use crate::core::types::{ContributionVector, FeatureIndex, FeatureVector, NodeIndex, Score};
pub use crate::io::model_file::{DecodedEnsemble, DecodedTree};
pub use crate::prediction::{Condition, NodeMeanValues, Predictor};
pub use crate::tree::{Node, Tree};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
