//! Error handling and error types for xgb-shap.
//!
//! Every fallible operation in the crate returns [`Result`], carrying a
//! [`ShapError`]. The computation is deterministic, so none of these errors
//! is worth retrying: they describe either a bad model, a bad input vector,
//! or a broken internal invariant.

use std::io;
use thiserror::Error;

/// Main error type for the xgb-shap library.
#[derive(Error, Debug)]
pub enum ShapError {
    /// Structural problems in the decoded ensemble: bad node counts,
    /// out-of-range children, zero hessian sums, inconsistent tree limits.
    #[error("Malformed model: {message}")]
    MalformedModel {
        /// What is wrong, prefixed with the tree index when known
        message: String,
    },

    /// Neither an explicit tree limit nor the model's `best_ntree_limit`
    /// attribute is available.
    #[error("No tree limit available: the model has no best_ntree_limit attribute and none was given")]
    MissingTreeLimit,

    /// The feature vector does not cover every split feature of the model.
    #[error("Invalid feature vector: model requires at least {required} features, got {actual}")]
    InvalidFeatureVector {
        /// Minimum length: one past the largest split feature
        required: usize,
        /// Length of the vector that was passed in
        actual: usize,
    },

    /// The path ledger reached a state that is mathematically impossible.
    #[error("Algorithm invariant violated: {message}")]
    AlgorithmInvariantViolation {
        /// The violated condition
        message: String,
    },

    /// Feature table loading errors
    #[error("Data loading error: {message}")]
    DataLoading {
        /// Where and why loading failed
        message: String,
    },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        #[from]
        source: io::Error,
    },

    /// JSON decoding errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// CSV parsing errors
    #[cfg(feature = "csv")]
    #[error("CSV parsing error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },
}

/// Type alias for Results using ShapError
pub type Result<T> = std::result::Result<T, ShapError>;

impl ShapError {
    /// Create a malformed model error
    pub fn malformed_model<S: Into<String>>(message: S) -> Self {
        ShapError::MalformedModel {
            message: message.into(),
        }
    }

    /// Create an algorithm invariant violation
    pub fn invariant_violation<S: Into<String>>(message: S) -> Self {
        ShapError::AlgorithmInvariantViolation {
            message: message.into(),
        }
    }

    /// Create a data loading error
    pub fn data_loading<S: Into<String>>(message: S) -> Self {
        ShapError::DataLoading {
            message: message.into(),
        }
    }

    /// Create an invalid feature vector error
    pub fn invalid_feature_vector(required: usize, actual: usize) -> Self {
        ShapError::InvalidFeatureVector { required, actual }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ShapError::MalformedModel { .. } => "malformed_model",
            ShapError::MissingTreeLimit => "missing_tree_limit",
            ShapError::InvalidFeatureVector { .. } => "invalid_feature_vector",
            ShapError::AlgorithmInvariantViolation { .. } => "algorithm_invariant_violation",
            ShapError::DataLoading { .. } => "data_loading",
            ShapError::IO { .. } => "io",
            ShapError::Json { .. } => "json",
            #[cfg(feature = "csv")]
            ShapError::Csv { .. } => "csv",
        }
    }
}

/// Build a [`ShapError::MalformedModel`] from a message or format string.
#[macro_export]
macro_rules! malformed_model {
    ($msg:expr) => {
        $crate::core::error::ShapError::malformed_model($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::ShapError::malformed_model(format!($fmt, $($arg)*))
    };
}

/// Return early with `$err` unless `$cond` holds.
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}
pub(crate) use ensure;
