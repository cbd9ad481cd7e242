//! Computes feature contributions for every row of a CSV feature table.
//!
//! Usage: `calculate_contributions --model <model.json> --features <features.csv> [--ntree-limit N]`
//!
//! The feature table has no header; an empty cell is a missing value. An
//! `--ntree-limit` of 0 (the default) uses the model's `best_ntree_limit`.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use xgb_shap::io::contributions_from_files;

#[derive(Parser, Debug)]
#[command(about = "compute XGBoost feature contributions")]
#[command(long_about = "compute TreeSHAP feature contributions for every row of a csv file")]
struct Args {
    #[arg(short, long, help = "the path to the XGBoost model JSON file")]
    model: PathBuf,
    #[arg(
        short,
        long,
        help = "the path to a csv file of features, one row per feature set"
    )]
    features: PathBuf,
    #[arg(
        short = 'n',
        long = "ntree-limit",
        default_value_t = 0,
        help = "number of trees to use; 0 reads best_ntree_limit from the model"
    )]
    ntree_limit: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let table = contributions_from_files(&args.model, &args.features, args.ntree_limit)
        .with_context(|| {
            format!(
                "computing contributions for {} with model {}",
                args.features.display(),
                args.model.display()
            )
        })?;

    for (i, (features, contribs)) in table
        .features
        .iter()
        .zip(&table.contributions)
        .enumerate()
    {
        println!("Feature set {}:", i);
        for (j, feature) in features.iter().enumerate() {
            match feature {
                Some(value) => println!("  Feature {}: {:.6}", j, value),
                None => println!("  Feature {}: missing", j),
            }
        }
        println!("Contributions for feature set {}:", i);
        for (j, contribution) in contribs.iter().enumerate() {
            println!("  Contribution {}: {:.6}", j, contribution);
        }
    }

    Ok(())
}
