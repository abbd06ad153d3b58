use crate::error::OrthoError;
use crate::seqio::{fasta_header, open_maybe_gz, sibling_output, StagedOutput};
use anyhow::{Context, Result};
use clap::Args;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Append ` - Copy N` to the N-th occurrence of a repeated FASTA header.
#[derive(Args, Debug, Clone)]
pub struct LabelDupesArgs {
    /// Input FASTA (optionally gzipped)
    #[arg(value_name = "INPUT_FASTA")]
    pub input: PathBuf,

    /// Output FASTA (default: <input without extension>_CopyN.fasta)
    #[arg(short = 'o', long = "output", value_name = "FASTA")]
    pub output: Option<PathBuf>,
}

/// Tracks how often each header has been seen.
#[derive(Default)]
pub struct DupeLabeler {
    seen: HashMap<String, usize>,
}

impl DupeLabeler {
    pub fn label(&mut self, header: &str) -> String {
        let n = self.seen.entry(header.to_string()).or_insert(0);
        *n += 1;
        if *n == 1 {
            header.to_string()
        } else {
            format!("{} - Copy {}", header, n)
        }
    }
}

pub fn run(args: LabelDupesArgs) -> Result<()> {
    let output = args.output.clone().unwrap_or_else(|| sibling_output(&args.input, "_CopyN.fasta"));
    let reader = open_maybe_gz(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let mut out = StagedOutput::create(&output)?;
    let mut labeler = DupeLabeler::default();
    let (mut headers, mut relabeled) = (0usize, 0usize);

    for line in reader.lines() {
        let line = line.map_err(|e| OrthoError::unreadable(&args.input, e))?;
        let written = match fasta_header(&line) {
            Some(header) => {
                let labeled = labeler.label(&header);
                headers += 1;
                if labeled.len() != header.len() {
                    relabeled += 1;
                }
                writeln!(out, ">{}", labeled)
            }
            None => writeln!(out, "{}", line),
        };
        written.map_err(|e| OrthoError::write_failure(&output, e))?;
    }
    let output = out.persist()?;

    log::info!("Relabelled {} of {} headers into {}", relabeled, headers, output.display());
    Ok(())
}
