//! Certiva CLI - offline certificate verification tooling.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;

#[derive(Parser)]
#[command(name = "certiva")]
#[command(author, version, about = "Certificate verification tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract structured certificate fields from a text file
    Extract {
        /// Path to the document text (e.g. an OCR transcript)
        #[arg(value_name = "TEXT_FILE")]
        file: PathBuf,
    },

    /// Compare two embeddings stored as JSON arrays
    Compare {
        /// Path to the first embedding (JSON array of numbers)
        #[arg(value_name = "EMBEDDING_A")]
        first: PathBuf,

        /// Path to the second embedding (JSON array of numbers)
        #[arg(value_name = "EMBEDDING_B")]
        second: PathBuf,

        /// Match threshold
        #[arg(short, long, default_value_t = 0.9)]
        threshold: f32,

        /// Distance metric: euclidean or cosine
        #[arg(short, long, default_value = "euclidean")]
        metric: String,
    },

    /// Print the content hash used as a certificate's ledger key
    Hash {
        /// Path to the certificate document
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract { file } => commands::extract::execute(file).await,
        Commands::Compare {
            first,
            second,
            threshold,
            metric,
        } => commands::compare::execute(first, second, threshold, &metric),
        Commands::Hash { file } => commands::hash::execute(file),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {e:#}", "error:".red().bold());
            std::process::exit(exit_codes::GENERAL_ERROR);
        }
    }
}
