//! Input decoding: XGBoost JSON model files and CSV feature tables.

#[cfg(feature = "csv")]
pub mod batch;
#[cfg(feature = "csv")]
pub mod features;
pub mod model_file;

#[cfg(feature = "csv")]
pub use batch::{contributions_from_files, TableContributions};
#[cfg(feature = "csv")]
pub use features::{read_feature_rows, read_feature_rows_from};
pub use model_file::{DecodedEnsemble, DecodedTree, ModelInteger, TreeParam};
