//! Cluster-size statistics (`og-stats`).
//!
//! Takes one or more `*_parsed.json` documents written by `parse` and emits a
//! single tab-separated table with one row of descriptive statistics over the
//! member-list sizes of each document.

use crate::clusters::ClusterMap;
use crate::error::OrthoError;
use crate::seqio::{file_stem_string, open_maybe_gz, timestamped_name, StagedOutput};
use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Clone)]
pub struct OgStatsArgs {
    /// One or more *_parsed.json files
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output basename; writes <NAME>__og_stats.txt (default: timestamped name)
    #[arg(short = 'n', long = "name", value_name = "NAME")]
    pub name: Option<String>,
}

/// Descriptive statistics over cluster sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterStats {
    pub cluster_num: usize,
    pub min: usize,
    pub max: usize,
    pub mean: f64,
    pub median: f64,
    /// Most frequent size; the earliest one seen wins a tie.
    pub mode: usize,
    pub std_dev: f64,
    pub variance: f64,
    pub singleton_num: usize,
}

impl ClusterStats {
    /// `None` for an empty size list.
    pub fn from_sizes(sizes: &[usize]) -> Option<Self> {
        let min = *sizes.iter().min()?;
        let max = *sizes.iter().max()?;
        let n = sizes.len() as f64;
        let mean = sizes.iter().sum::<usize>() as f64 / n;

        let mut sorted = sizes.to_vec();
        sorted.sort_unstable();
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 1 {
            sorted[mid] as f64
        } else {
            (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
        };

        let mut counts: HashMap<usize, usize> = HashMap::new();
        let mut mode = sizes[0];
        for &s in sizes {
            let c = {
                let c = counts.entry(s).or_insert(0);
                *c += 1;
                *c
            };
            if c > counts[&mode] {
                mode = s;
            }
        }

        let variance = sizes.iter().map(|&s| (s as f64 - mean).powi(2)).sum::<f64>() / n;

        Some(ClusterStats {
            cluster_num: sizes.len(),
            min,
            max,
            mean,
            median,
            mode,
            std_dev: variance.sqrt(),
            variance,
            singleton_num: sizes.iter().filter(|&&s| s == 1).count(),
        })
    }

    pub fn has_singletons(&self) -> bool {
        self.singleton_num > 0
    }
}

#[derive(Serialize)]
struct StatsRow {
    #[serde(rename = "OG_Source")]
    source: String,
    #[serde(rename = "Cluster_Num")]
    cluster_num: usize,
    #[serde(rename = "Min_Size")]
    min: usize,
    #[serde(rename = "Max_Size")]
    max: usize,
    #[serde(rename = "Avg_Mean_Size")]
    mean: String,
    #[serde(rename = "Median_Size")]
    median: String,
    #[serde(rename = "Mode_Size")]
    mode: usize,
    #[serde(rename = "Std_Dev")]
    std_dev: String,
    #[serde(rename = "Variance")]
    variance: String,
    #[serde(rename = "Singletons")]
    singletons: &'static str,
    #[serde(rename = "Singleton_Num")]
    singleton_num: usize,
}

impl StatsRow {
    fn new(source: String, st: &ClusterStats) -> Self {
        StatsRow {
            source,
            cluster_num: st.cluster_num,
            min: st.min,
            max: st.max,
            mean: fmt_exact(st.mean),
            median: if st.cluster_num % 2 == 1 { fmt_exact(st.median) } else { fmt_float(st.median) },
            mode: st.mode,
            std_dev: fmt_float(st.std_dev),
            variance: fmt_exact(st.variance),
            singletons: if st.has_singletons() { "Y" } else { "N" },
            singleton_num: st.singleton_num,
        }
    }
}

/// `2.0` for integral values, shortest round-trip text otherwise.
fn fmt_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// Integral values as integers (`2`), others as in [`fmt_float`]. Mean,
/// odd-length median and variance of whole-number sizes print this way.
fn fmt_exact(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{:.0}", v)
    } else {
        fmt_float(v)
    }
}

/// Label for a document: file stem with `_parsed` removed.
fn source_label(path: &Path) -> String {
    file_stem_string(path).replace("_parsed", "")
}

fn load_clusters(path: &Path) -> Result<ClusterMap, OrthoError> {
    let rdr = open_maybe_gz(path)?;
    serde_json::from_reader(rdr).map_err(|e| {
        if e.is_io() {
            OrthoError::InputUnreadable { path: path.to_path_buf(), source: e.into() }
        } else {
            OrthoError::malformed(path, e.line(), e.to_string())
        }
    })
}

fn output_path(args: &OgStatsArgs) -> PathBuf {
    match &args.name {
        Some(base) => PathBuf::from(format!("{}__og_stats.txt", base)),
        None => timestamped_name("Orthology_Comparison_Stats__"),
    }
}

/// Execute the `og-stats` subcommand.
pub fn run(args: OgStatsArgs) -> Result<()> {
    let mut rows = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let map = load_clusters(path).with_context(|| format!("Failed to load clusters from {}", path.display()))?;
        let st = ClusterStats::from_sizes(&map.sizes())
            .ok_or_else(|| OrthoError::malformed(path, 0, "document contains no clusters"))?;
        log::debug!("{}: {} clusters, mean size {}", path.display(), st.cluster_num, st.mean);
        rows.push(StatsRow::new(source_label(path), &st));
    }

    let mut w = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in &rows {
        w.serialize(row).context("Failed to render statistics row")?;
    }
    let bytes = w.into_inner().map_err(|e| e.into_error())?;

    let out = output_path(&args);
    StagedOutput::rendered(&out, &bytes)?.persist()?;

    log::info!("Wrote statistics for {} result files to {}", rows.len(), out.display());
    Ok(())
}
