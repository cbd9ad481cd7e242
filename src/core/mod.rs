//! Core infrastructure module for xgb-shap.
//!
//! - [`types`]: scalar aliases and the feature/contribution vector shapes
//! - [`constants`]: sentinels and path-buffer sizing
//! - [`error`]: the crate error type and `Result` alias

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Result, ShapError};
