//! Extract command - run the field extraction rules over a text file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use certiva_core::FieldExtractor;
use colored::Colorize;
use tracing::debug;

use crate::exit_codes;

/// Execute the extract command.
pub async fn execute(file: PathBuf) -> Result<i32> {
    let text = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read text file: {}", file.display()))?;

    debug!(path = %file.display(), chars = text.len(), "Read document text");

    let extractor = FieldExtractor::rules_only();
    let fields = extractor.extract(&text).await;

    println!("{}", "Extracted certificate fields:".bold());
    println!(
        "{}",
        serde_json::to_string_pretty(&fields).context("Failed to serialize fields")?
    );

    let found = [
        &fields.student_name,
        &fields.institute_name,
        &fields.degree,
        &fields.major,
        &fields.date_of_issue,
        &fields.certificate_id,
    ]
    .iter()
    .filter(|f| f.is_some())
    .count();

    println!();
    println!("   {} {found}/6 fields found", "Coverage:".dimmed());

    Ok(exit_codes::SUCCESS)
}
