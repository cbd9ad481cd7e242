//! Contributions for every row of a CSV feature table.

use super::features::read_feature_rows;
use crate::config::PredictorConfig;
use crate::core::error::Result;
use crate::core::types::Score;
use crate::prediction::Predictor;
use std::path::Path;

/// Feature rows read from a table and their contributions, row for row.
#[derive(Debug, Clone, PartialEq)]
pub struct TableContributions {
    /// Feature vectors as read; `None` is a missing value
    pub features: Vec<Vec<Option<Score>>>,
    /// One contribution per feature, without the trailing bias
    pub contributions: Vec<Vec<Score>>,
}

/// Load a JSON model and a header-less CSV feature table and compute the
/// contributions of every row in parallel.
///
/// An `ntree_limit` of 0 uses the model's `best_ntree_limit`. The whole
/// table fails if any row fails.
pub fn contributions_from_files<M, F>(
    model_path: M,
    features_path: F,
    ntree_limit: usize,
) -> Result<TableContributions>
where
    M: AsRef<Path>,
    F: AsRef<Path>,
{
    let config = PredictorConfig::new().with_ntree_limit(Some(ntree_limit));
    let predictor = Predictor::from_json_file(model_path, config)?;
    let features = read_feature_rows(features_path)?;

    let contributions = predictor
        .predict_contributions_batch(&features)?
        .into_iter()
        .map(|mut contribs| {
            contribs.pop();
            contribs
        })
        .collect();

    Ok(TableContributions {
        features,
        contributions,
    })
}
