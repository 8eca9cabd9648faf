//! Compare command - score two embeddings against a threshold.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use certiva_core::{compare, DistanceMetric};
use colored::Colorize;
use tracing::debug;

use crate::exit_codes;

fn read_embedding(path: &Path) -> Result<Vec<f32>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read embedding file: {}", path.display()))?;

    serde_json::from_str(&raw)
        .with_context(|| format!("Embedding file is not a JSON number array: {}", path.display()))
}

/// Execute the compare command.
pub fn execute(first: PathBuf, second: PathBuf, threshold: f32, metric: &str) -> Result<i32> {
    let metric: DistanceMetric = metric
        .parse()
        .with_context(|| format!("Unknown distance metric: {metric}"))?;

    let a = read_embedding(&first)?;
    let b = read_embedding(&second)?;

    debug!(dim_a = a.len(), dim_b = b.len(), ?metric, "Comparing embeddings");

    let result = compare(&a, &b, metric, threshold).context("Comparison failed")?;

    let verdict = if result.prediction {
        "MATCH".green().bold()
    } else {
        "NO MATCH".red().bold()
    };

    println!();
    println!("   {verdict}");
    println!();
    println!("   {} {}", "Distance:".dimmed(), result.distance);
    println!("   {} {}", "Threshold:".dimmed(), result.threshold);
    println!("   {} {}", "Confidence:".dimmed(), result.confidence);

    if result.prediction {
        Ok(exit_codes::SUCCESS)
    } else {
        Ok(exit_codes::NO_MATCH)
    }
}
