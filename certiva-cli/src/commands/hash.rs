//! Hash command - compute a document's ledger key.

use std::path::PathBuf;

use anyhow::{Context, Result};
use certiva_core::content_hash;

use crate::exit_codes;

/// Execute the hash command.
pub fn execute(file: PathBuf) -> Result<i32> {
    let content =
        std::fs::read(&file).with_context(|| format!("Failed to read file: {}", file.display()))?;

    println!("{}", content_hash(&content));

    Ok(exit_codes::SUCCESS)
}
