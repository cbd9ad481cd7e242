//! Common test utilities for xgb-shap integration tests.

#![allow(dead_code)]

use rand::prelude::*;
use std::collections::BTreeSet;
use std::path::PathBuf;
use xgb_shap::*;

/// Path of a file under `tests/data`
pub fn test_data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Two-level tree on features 0 and 1.
///
/// ```text
/// 0: f0 < 0.5 (missing -> left), h 10
/// ├── 1: f1 < 1.0 (missing -> right), h 4
/// │   ├── 3: 2.0, h 1
/// │   └── 4: 0.5, h 3
/// └── 2: -1.0, h 6
/// ```
pub fn two_level_tree() -> DecodedTree {
    DecodedTree::new()
        .split(1, 0, 0.5, true, 10.0)
        .split(3, 1, 1.0, false, 4.0)
        .leaf(-1.0, 6.0)
        .leaf(2.0, 1.0)
        .leaf(0.5, 3.0)
}

/// Tree that splits on feature 2 twice along one path, so the walk has to
/// unwind and re-extend it.
///
/// ```text
/// 0: f2 < 0.0, h 8
/// ├── 1: f0 < 0.25 (missing -> left), h 5
/// │   ├── 3: f2 < -1.0 (missing -> left), h 2
/// │   │   ├── 7: 1.5, h 1.5
/// │   │   └── 8: -0.2, h 0.5
/// │   └── 4: 0.3, h 3
/// └── 2: f0 < 0.75, h 3
///     ├── 5: -0.4, h 1
///     └── 6: 0.9, h 2
/// ```
pub fn repeated_feature_tree() -> DecodedTree {
    DecodedTree::new()
        .split(1, 2, 0.0, false, 8.0)
        .split(3, 0, 0.25, true, 5.0)
        .split(5, 0, 0.75, false, 3.0)
        .split(7, 2, -1.0, true, 2.0)
        .leaf(0.3, 3.0)
        .leaf(-0.4, 1.0)
        .leaf(0.9, 2.0)
        .leaf(1.5, 1.5)
        .leaf(-0.2, 0.5)
}

/// Features 0 and 1 are interchangeable: the output only depends on how
/// many of them are below 0.5, and every branch carries the same cover.
pub fn symmetric_tree() -> DecodedTree {
    DecodedTree::new()
        .split(1, 0, 0.5, false, 8.0)
        .split(3, 1, 0.5, false, 4.0)
        .split(5, 1, 0.5, false, 4.0)
        .leaf(3.0, 2.0)
        .leaf(1.0, 2.0)
        .leaf(1.0, 2.0)
        .leaf(-2.0, 2.0)
}

/// Three-tree ensemble over features 0..3, limited to all of its trees.
pub fn small_ensemble() -> DecodedEnsemble {
    DecodedEnsemble::new(
        vec![two_level_tree(), repeated_feature_tree(), symmetric_tree()],
        Some(3),
    )
}

/// Predictor over [`small_ensemble`] with default configuration
pub fn small_predictor() -> Predictor {
    Predictor::new(&small_ensemble(), PredictorConfig::default()).unwrap()
}

/// Seeded random feature vectors; roughly one value in five is missing.
pub fn random_feature_rows(num_rows: usize, num_features: usize, seed: u64) -> Vec<Vec<Option<f32>>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..num_rows)
        .map(|_| {
            (0..num_features)
                .map(|_| {
                    if rng.gen_bool(0.2) {
                        None
                    } else {
                        Some(rng.gen_range(-2.0..2.0))
                    }
                })
                .collect()
        })
        .collect()
}

/// Expected tree output when only the features in `known` are observed:
/// known splits follow the feature vector, unknown splits average both
/// children weighted by their share of the parent's hessian.
fn conditional_expectation(tree: &Tree, features: &[Option<f32>], known: &BTreeSet<usize>, id: usize) -> f64 {
    let node = tree.node(id);
    match node.children() {
        None => node.leaf_value() as f64,
        Some((left, right)) => {
            if known.contains(&node.split_feature()) {
                let next = node
                    .next_child(features[node.split_feature()])
                    .expect("internal node has a next child");
                conditional_expectation(tree, features, known, next)
            } else {
                let left_weight = tree.node(left).sum_hessian() as f64;
                let right_weight = tree.node(right).sum_hessian() as f64;
                (conditional_expectation(tree, features, known, left) * left_weight
                    + conditional_expectation(tree, features, known, right) * right_weight)
                    / node.sum_hessian() as f64
            }
        }
    }
}

fn factorial(n: usize) -> f64 {
    (1..=n).map(|k| k as f64).product()
}

/// Exact Shapley values by enumerating every coalition of the features the
/// trees split on. Returns the same layout as the predictor: one value per
/// feature followed by the bias.
pub fn brute_force_contributions(trees: &[Tree], features: &[Option<f32>]) -> Vec<f64> {
    shapley_values(trees, features, Condition::Unconditioned)
}

/// Exact Shapley values of the game where one feature is always observed
/// (`Present`) or never observed (`Absent`). That feature is not a player,
/// and the bias slot is left at zero.
pub fn brute_force_conditioned(
    trees: &[Tree],
    features: &[Option<f32>],
    condition: Condition,
) -> Vec<f64> {
    shapley_values(trees, features, condition)
}

fn shapley_values(trees: &[Tree], features: &[Option<f32>], condition: Condition) -> Vec<f64> {
    let used: Vec<usize> = trees
        .iter()
        .flat_map(|tree| tree.nodes().iter())
        .filter(|node| !node.is_leaf())
        .map(|node| node.split_feature())
        .filter(|&feature| Some(feature) != condition.feature())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let num_players = used.len();

    let value = |known: &BTreeSet<usize>| -> f64 {
        let mut known = known.clone();
        if let Condition::Present(feature) = condition {
            known.insert(feature);
        }
        trees
            .iter()
            .map(|tree| conditional_expectation(tree, features, &known, 0))
            .sum()
    };

    let mut phi = vec![0.0; features.len() + 1];
    for (position, &feature) in used.iter().enumerate() {
        let others: Vec<usize> = used
            .iter()
            .enumerate()
            .filter(|&(p, _)| p != position)
            .map(|(_, &f)| f)
            .collect();

        for mask in 0u32..(1u32 << others.len()) {
            let coalition: BTreeSet<usize> = others
                .iter()
                .enumerate()
                .filter(|&(bit, _)| mask & (1 << bit) != 0)
                .map(|(_, &f)| f)
                .collect();
            let size = coalition.len();
            let weight =
                factorial(size) * factorial(num_players - size - 1) / factorial(num_players);

            let mut with_feature = coalition.clone();
            with_feature.insert(feature);
            phi[feature] += weight * (value(&with_feature) - value(&coalition));
        }
    }
    if condition == Condition::Unconditioned {
        phi[features.len()] = value(&BTreeSet::new());
    }
    phi
}
