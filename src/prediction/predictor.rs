//! Ensemble-level feature contributions.
//!
//! The predictor owns the validated trees and their cached mean-value
//! tables. It is immutable after construction, so one instance can serve
//! any number of threads; every call allocates its own path ledger and
//! accumulators.

use super::mean_values::NodeMeanValues;
use super::shap::{tree_contributions, Condition};
use crate::config::PredictorConfig;
use crate::core::error::{Result, ShapError};
use crate::core::types::{nan_as_missing, ContributionVector, FeatureVector, Score};
use crate::io::model_file::DecodedEnsemble;
use crate::tree::Tree;
use ndarray::{Array2, ArrayView2, Axis};
use rayon::prelude::*;
use std::path::Path;

/// Computes TreeSHAP feature contributions for an XGBoost ensemble.
#[derive(Debug, Clone)]
pub struct Predictor {
    /// The first `ntree_limit` trees of the model
    trees: Vec<Tree>,
    /// Mean-value table per tree, same order as `trees`
    mean_values: Vec<NodeMeanValues>,
    /// Minimum feature-vector length over the used trees
    num_features_required: usize,
    config: PredictorConfig,
}

static_assertions::assert_impl_all!(Predictor: Send, Sync);

impl Predictor {
    /// Build a predictor from a decoded ensemble.
    ///
    /// The tree limit comes from `config` when set (non-zero), otherwise
    /// from the model's `best_ntree_limit` attribute.
    ///
    /// # Errors
    /// [`ShapError::MissingTreeLimit`] when no limit is available,
    /// [`ShapError::MalformedModel`] when any tree is inconsistent, the
    /// limit attribute is not an integer, or the limit exceeds the number
    /// of trees.
    pub fn new(ensemble: &DecodedEnsemble, config: PredictorConfig) -> Result<Self> {
        let all_trees = ensemble
            .trees
            .iter()
            .enumerate()
            .map(|(index, decoded)| {
                Tree::from_decoded(decoded).map_err(|e| match e {
                    ShapError::MalformedModel { message } => {
                        ShapError::malformed_model(format!("tree {}: {}", index, message))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let ntree_limit = resolve_ntree_limit(ensemble, &config)?;
        if ntree_limit > all_trees.len() {
            return Err(ShapError::malformed_model(format!(
                "tree limit {} exceeds the {} trees in the model",
                ntree_limit,
                all_trees.len()
            )));
        }

        let mut trees = all_trees;
        trees.truncate(ntree_limit);

        let mean_values = trees
            .iter()
            .enumerate()
            .map(|(index, tree)| {
                NodeMeanValues::compute(tree).map_err(|e| match e {
                    ShapError::MalformedModel { message } => {
                        ShapError::malformed_model(format!("tree {}: {}", index, message))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let num_features_required = trees
            .iter()
            .map(Tree::num_features_required)
            .max()
            .unwrap_or(0);

        let predictor = Predictor {
            trees,
            mean_values,
            num_features_required,
            config,
        };

        log::debug!(
            "Predictor ready: {} of {} trees, {} features required, expected value {}",
            predictor.trees.len(),
            ensemble.num_trees(),
            predictor.num_features_required,
            predictor.expected_value()
        );

        Ok(predictor)
    }

    /// Decode an XGBoost JSON model file and build a predictor from it.
    pub fn from_json_file<P: AsRef<Path>>(path: P, config: PredictorConfig) -> Result<Self> {
        let ensemble = DecodedEnsemble::from_path(path)?;
        Self::new(&ensemble, config)
    }

    /// Decode an XGBoost JSON model document and build a predictor from it.
    pub fn from_json_str(json: &str, config: PredictorConfig) -> Result<Self> {
        let ensemble = DecodedEnsemble::from_json_str(json)?;
        Self::new(&ensemble, config)
    }

    /// Number of trees used
    pub fn ntree_limit(&self) -> usize {
        self.trees.len()
    }

    /// The trees used, in boosting order
    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Minimum feature-vector length
    pub fn num_features_required(&self) -> usize {
        self.num_features_required
    }

    /// Predictor configuration
    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// The bias term: sum of every used tree's expected output.
    pub fn expected_value(&self) -> Score {
        self.mean_values.iter().map(NodeMeanValues::root).sum()
    }

    /// Raw ensemble output: the sum of the reached leaf values.
    pub fn predict_margin(&self, features: &FeatureVector) -> Result<Score> {
        self.check_features(features)?;
        let mut margin = 0.0;
        for tree in &self.trees {
            margin += tree.predict(features)?;
        }
        Ok(margin)
    }

    /// Feature contributions for one feature vector.
    ///
    /// The result has `features.len() + 1` entries; the last one is the
    /// bias (expected value) and is not a feature contribution.
    pub fn predict_contributions(&self, features: &FeatureVector) -> Result<ContributionVector> {
        self.predict_contributions_with_condition(features, Condition::Unconditioned)
    }

    /// Feature contributions with one feature conditioned present or
    /// absent. Only the unconditioned variant carries the bias term.
    pub fn predict_contributions_with_condition(
        &self,
        features: &FeatureVector,
        condition: Condition,
    ) -> Result<ContributionVector> {
        self.check_features(features)?;

        let num_columns = features.len() + 1;
        let mut contribs = vec![0.0; num_columns];
        let mut tree_contribs = vec![0.0; num_columns];

        for (index, (tree, mean_values)) in self.trees.iter().zip(&self.mean_values).enumerate() {
            log::trace!("Computing contributions for tree {}", index);
            tree_contribs.iter_mut().for_each(|c| *c = 0.0);
            tree_contributions(tree, mean_values, features, condition, &mut tree_contribs)?;
            for (total, value) in contribs.iter_mut().zip(&tree_contribs) {
                *total += *value;
            }
        }

        if self.config.check_additivity && condition == Condition::Unconditioned {
            self.check_additivity(features, &contribs)?;
        }

        Ok(contribs)
    }

    /// Contributions for many feature vectors, computed in parallel.
    ///
    /// Fails as a whole if any row fails.
    pub fn predict_contributions_batch(
        &self,
        rows: &[Vec<Option<Score>>],
    ) -> Result<Vec<ContributionVector>> {
        log::debug!("Computing contributions for {} rows", rows.len());
        rows.par_iter()
            .map(|row| self.predict_contributions(row))
            .collect()
    }

    /// Contributions for a row-major feature matrix where `NaN` marks a
    /// missing value. Returns a `(rows, features + 1)` matrix.
    pub fn predict_contributions_matrix(
        &self,
        features: ArrayView2<'_, Score>,
    ) -> Result<Array2<Score>> {
        let (num_rows, num_features) = features.dim();
        let rows = features
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|row| self.predict_contributions(&nan_as_missing(row.iter().copied())))
            .collect::<Result<Vec<_>>>()?;

        let flat: Vec<Score> = rows.into_iter().flatten().collect();
        Array2::from_shape_vec((num_rows, num_features + 1), flat)
            .map_err(|e| ShapError::invariant_violation(format!("contribution matrix: {}", e)))
    }

    fn check_features(&self, features: &FeatureVector) -> Result<()> {
        if features.len() < self.num_features_required {
            return Err(ShapError::invalid_feature_vector(
                self.num_features_required,
                features.len(),
            ));
        }
        Ok(())
    }

    fn check_additivity(&self, features: &FeatureVector, contribs: &[Score]) -> Result<()> {
        let margin = self.predict_margin(features)?;
        let total: Score = contribs.iter().sum();
        let difference = (total - margin).abs();
        if difference > self.config.additivity_tolerance {
            log::warn!(
                "Contributions sum to {} but the margin is {} (difference {})",
                total,
                margin,
                difference
            );
        }
        Ok(())
    }
}

fn resolve_ntree_limit(ensemble: &DecodedEnsemble, config: &PredictorConfig) -> Result<usize> {
    let attribute = ensemble
        .best_ntree_limit
        .as_ref()
        .filter(|value| !value.is_blank());

    if let Some(limit) = config.explicit_ntree_limit() {
        if let Some(best) = attribute.and_then(|value| value.as_count()) {
            if limit > best {
                log::warn!(
                    "Tree limit override {} is larger than the model's best_ntree_limit {}",
                    limit,
                    best
                );
            }
        }
        return Ok(limit);
    }

    match attribute {
        None => Err(ShapError::MissingTreeLimit),
        Some(value) => value.as_count().ok_or_else(|| {
            ShapError::malformed_model(format!(
                "best_ntree_limit {} is not a non-negative integer",
                value
            ))
        }),
    }
}
