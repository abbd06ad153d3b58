//! FASTA header anonymiser (`assign-headers`).
//!
//! Replaces every FASTA header with a fresh 16-character alphanumeric code and
//! appends `code \t original header \t source file` rows to a ledger. Codes are
//! unique across the whole ledger, so the same ledger can be reused for any
//! number of FASTA files. The ledger is created if it does not exist.
//!
//! ### Example
//! ```text
//! orthokit assign-headers proteome_A.faa encoding_ledger.txt --seed 42
//! ```

use crate::error::OrthoError;
use crate::seqio::{fasta_header, file_stem_string, open_maybe_gz, sibling_output, StagedOutput};
use anyhow::{Context, Result};
use clap::Args;
use rand::distributions::Alphanumeric;
use rand::prelude::*;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Length of a generated header code.
pub const CODE_LEN: usize = 16;

#[derive(Args, Debug, Clone)]
pub struct AssignHeadersArgs {
    /// Input FASTA (optionally gzipped)
    #[arg(value_name = "INPUT_FASTA")]
    pub input: PathBuf,

    /// Ledger of assigned codes (tab-separated; created if missing)
    #[arg(value_name = "LEDGER")]
    pub ledger: PathBuf,

    /// Output FASTA (default: <input without extension>_edit.fasta)
    #[arg(short = 'o', long = "output", value_name = "FASTA")]
    pub output: Option<PathBuf>,

    /// Optional RNG seed for reproducibility
    #[arg(long = "seed", value_name = "INT")]
    pub seed: Option<u64>,
}

/// Hands out codes that were never handed out before.
pub struct CodeBook {
    taken: HashSet<String>,
    rng: StdRng,
}

impl CodeBook {
    pub fn new(taken: HashSet<String>, rng: StdRng) -> Self {
        CodeBook { taken, rng }
    }

    pub fn issue(&mut self) -> String {
        loop {
            let code: String = (&mut self.rng)
                .sample_iter(&Alphanumeric)
                .take(CODE_LEN)
                .map(char::from)
                .collect();
            if self.taken.insert(code.clone()) {
                return code;
            }
            log::debug!("code {} already taken, drawing again", code);
        }
    }
}

/// Codes in the first column of an existing ledger; empty if there is none.
pub fn load_ledger_codes(path: &Path) -> Result<HashSet<String>, OrthoError> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    let rdr = open_maybe_gz(path)?;
    let mut csv_rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(rdr);
    let mut codes = HashSet::new();
    for rec in csv_rdr.records() {
        let rec = rec.map_err(|e| OrthoError::from_csv(path, e))?;
        if let Some(code) = rec.get(0).filter(|c| !c.is_empty()) {
            codes.insert(code.to_string());
        }
    }
    Ok(codes)
}

fn append_ledger(path: &Path, rows: &[(String, String)], source: &str) -> Result<(), OrthoError> {
    let f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| OrthoError::write_failure(path, e))?;
    let mut w = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(BufWriter::new(f));
    for (code, header) in rows {
        w.write_record([code.as_str(), header.as_str(), source])
            .map_err(|e| OrthoError::write_failure(path, e.into()))?;
    }
    w.flush().map_err(|e| OrthoError::write_failure(path, e))
}

/// Execute the `assign-headers` subcommand.
/// The edited FASTA is staged, the ledger appended, and only then is the
/// FASTA moved into place, so no code reaches disk without a ledger row.
pub fn run(args: AssignHeadersArgs) -> Result<()> {
    let taken = load_ledger_codes(&args.ledger)
        .with_context(|| format!("Failed to read ledger {}", args.ledger.display()))?;
    let prior = taken.len();
    let rng: StdRng = match args.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(thread_rng()).context("Failed to initialize RNG")?,
    };
    let mut book = CodeBook::new(taken, rng);

    let output = args.output.clone().unwrap_or_else(|| sibling_output(&args.input, "_edit.fasta"));
    let reader = open_maybe_gz(&args.input)?;
    let mut out = StagedOutput::create(&output)?;
    let mut assigned: Vec<(String, String)> = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(|e| OrthoError::unreadable(&args.input, e))?;
        let written = match fasta_header(&line) {
            Some(header) => {
                let code = book.issue();
                let w = writeln!(out, ">{}", code);
                assigned.push((code, header));
                w
            }
            None => writeln!(out, "{}", line),
        };
        written.map_err(|e| OrthoError::write_failure(&output, e))?;
    }
    out.flush().map_err(|e| OrthoError::write_failure(&output, e))?;

    append_ledger(&args.ledger, &assigned, &file_stem_string(&args.input))?;
    let output = out.persist()?;
    log::info!(
        "Assigned {} codes ({} already in ledger) -> {}; ledger {}",
        assigned.len(),
        prior,
        output.display(),
        args.ledger.display()
    );
    Ok(())
}
