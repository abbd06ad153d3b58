//! orthokit: orthologous-clustering toolkit
//!
//! Subcommands:
//! - `parse`: turn CD-HIT / Diamond / MMseqs2 / USEARCH results into JSON and tables
//! - `og-stats`: cluster-size statistics over parsed JSON files
//! - `ortho-db`: merge pivot tables into a presence/absence database
//! - `assign-headers`: replace FASTA headers with ledger-tracked random codes
//! - `label-dupes`: number repeated FASTA headers

mod assign_headers;
mod clusters;
mod error;
mod extract;
mod label_dupes;
mod og_stats;
mod ortho_db;
mod parse;
mod seqio;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// orthokit CLI
#[derive(Parser, Debug)]
#[command(name = "orthokit")]
#[command(author, version, about = "Orthology clustering utilities in Rust", long_about = None)]
struct Cli {
    /// Subcommands
    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a clustering result into JSON, pivot and wide tables
    Parse(parse::ParseArgs),
    /// Cluster-size statistics for one or more *_parsed.json files
    OgStats(og_stats::OgStatsArgs),
    /// Merge pivot tables into one presence/absence database
    OrthoDb(ortho_db::OrthoDbArgs),
    /// Replace FASTA headers with unique random codes and record them in a ledger
    AssignHeaders(assign_headers::AssignHeadersArgs),
    /// Append " - Copy N" to repeated FASTA headers
    LabelDupes(label_dupes::LabelDupesArgs),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Parse(args) => parse::run(args)?,
        Commands::OgStats(args) => og_stats::run(args)?,
        Commands::OrthoDb(args) => ortho_db::run(args)?,
        Commands::AssignHeaders(args) => assign_headers::run(args)?,
        Commands::LabelDupes(args) => label_dupes::run(args)?,
    }
    Ok(())
}
