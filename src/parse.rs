//! Clustering-result parser (`parse`).
//!
//! Reads one result file from CD-HIT (`.clstr`), `diamond cluster` (`.txt`),
//! MMseqs2 (`.tsv`) or USEARCH (`.uc`), plain or `.gz`, and writes three views
//! of the same clusters:
//!
//! - `<base>_parsed.txt`: one row per cluster, members comma-joined
//! - `<base>_parsed_pivot.txt`: one row per (cluster, member)
//! - `<base>_parsed.json`: `{cluster id: [members]}`
//!
//! ### Example
//! ```text
//! orthokit parse -i proteomes.clstr --cd-hit -o cdhit_run1
//! ```

use crate::error::OrthoError;
use crate::extract::{extract, ClusterFormat};
use crate::seqio::{file_stem_string, open_maybe_gz, persist_all, StagedOutput};
use anyhow::{Context, Result};
use clap::{ArgGroup, Args};
use std::path::PathBuf;

/// Parse a clustering-tool result file into JSON, pivot and wide tables.
#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("format").required(true).multiple(false)))]
pub struct ParseArgs {
    /// Clustering result file (optionally .gz)
    #[arg(short = 'i', long = "input", value_name = "INPUT_FILE")]
    pub input: PathBuf,

    /// Input is a CD-HIT *.clstr file
    #[arg(short = 'c', long = "cd-hit", visible_alias = "cd_hit", group = "format")]
    pub cd_hit: bool,

    /// Input is a `diamond cluster` *.txt file
    #[arg(short = 'd', long = "diamond", group = "format")]
    pub diamond: bool,

    /// Input is an MMseqs2 *.tsv file
    #[arg(short = 'm', long = "mmseqs2", group = "format")]
    pub mmseqs2: bool,

    /// Input is a USEARCH *.uc file
    #[arg(short = 'u', long = "usearch", group = "format")]
    pub usearch: bool,

    /// Output basename (default: input file name without extension)
    #[arg(short = 'o', long = "outname", value_name = "OUT_NAME")]
    pub out_name: Option<String>,
}

impl ParseArgs {
    /// The single selected format.
    pub fn format(&self) -> Result<ClusterFormat, OrthoError> {
        let picked: Vec<ClusterFormat> = [
            (self.cd_hit, ClusterFormat::CdHit),
            (self.diamond, ClusterFormat::Diamond),
            (self.mmseqs2, ClusterFormat::Mmseqs2),
            (self.usearch, ClusterFormat::Usearch),
        ]
        .into_iter()
        .filter_map(|(on, f)| on.then_some(f))
        .collect();
        match picked.as_slice() {
            [one] => Ok(*one),
            [] => Err(OrthoError::InvalidArguments(
                "select an input format: --cd-hit, --diamond, --mmseqs2 or --usearch".into(),
            )),
            _ => Err(OrthoError::InvalidArguments("select exactly one input format".into())),
        }
    }

    /// Output paths for the wide, pivot and JSON views.
    pub fn output_paths(&self) -> (PathBuf, PathBuf, PathBuf) {
        let base = self.out_name.clone().unwrap_or_else(|| file_stem_string(&self.input));
        (
            PathBuf::from(format!("{}_parsed.txt", base)),
            PathBuf::from(format!("{}_parsed_pivot.txt", base)),
            PathBuf::from(format!("{}_parsed.json", base)),
        )
    }
}

/// Execute the `parse` subcommand.
/// All three views are staged first and only moved into place together.
pub fn run(args: ParseArgs) -> Result<()> {
    let format = args.format()?;
    let desc = format.descriptor();
    let labels = desc.labels();

    let reader = open_maybe_gz(&args.input)?;
    let map = extract(format, reader, &args.input)
        .with_context(|| format!("Failed to parse {} results from {}", desc.name, args.input.display()))?;
    if map.is_empty() {
        log::warn!("No clusters found in {}", args.input.display());
    }

    let wide = map.to_wide_table(&labels).context("Failed to render wide table")?;
    let pivot = map.to_long_table(&labels).context("Failed to render pivot table")?;
    let json = map.to_json().context("Failed to render JSON")?;

    let (wide_path, pivot_path, json_path) = args.output_paths();
    persist_all(vec![
        StagedOutput::rendered(&wide_path, &wide)?,
        StagedOutput::rendered(&pivot_path, &pivot)?,
        StagedOutput::rendered(&json_path, &json)?,
    ])?;

    log::info!(
        "Parsed {} {} clusters ({} members) into {}, {}, {}",
        map.len(),
        desc.name,
        map.total_members(),
        wide_path.display(),
        pivot_path.display(),
        json_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clusters::ClusterMap;
    use std::fs;
    use tempfile::tempdir;

    fn args(input: PathBuf, out_name: Option<String>) -> ParseArgs {
        ParseArgs { input, cd_hit: false, diamond: false, mmseqs2: false, usearch: false, out_name }
    }

    #[test]
    fn format_selection_requires_exactly_one() {
        let mut a = args("x.uc".into(), None);
        assert!(matches!(a.format(), Err(OrthoError::InvalidArguments(_))));
        a.usearch = true;
        assert_eq!(a.format().unwrap(), ClusterFormat::Usearch);
        a.diamond = true;
        assert!(matches!(a.format(), Err(OrthoError::InvalidArguments(_))));
    }

    #[test]
    fn default_basename_is_input_stem() {
        let a = args("runs/mmseqs_cluster.tsv".into(), None);
        let (w, p, j) = a.output_paths();
        assert_eq!(w, PathBuf::from("mmseqs_cluster_parsed.txt"));
        assert_eq!(p, PathBuf::from("mmseqs_cluster_parsed_pivot.txt"));
        assert_eq!(j, PathBuf::from("mmseqs_cluster_parsed.json"));
    }

    #[test]
    fn writes_all_three_views() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("dmd.txt");
        fs::write(&input, "centroid\tmember\nA\tA\nA\tB\nC\tC\n").unwrap();
        let base = dir.path().join("run").display().to_string();

        let mut a = args(input, Some(base.clone()));
        a.diamond = true;
        run(a).unwrap();

        let wide = fs::read_to_string(format!("{}_parsed.txt", base)).unwrap();
        assert_eq!(wide, "Diamond_ID\tDiamond_Members\nDMD_Cluster_0\tA,B\nDMD_Cluster_1\tC\n");
        let pivot = fs::read_to_string(format!("{}_parsed_pivot.txt", base)).unwrap();
        assert_eq!(
            pivot,
            "Diamond_ID\tDiamond_Members\nDMD_Cluster_0\tA\nDMD_Cluster_0\tB\nDMD_Cluster_1\tC\n"
        );
        let json = fs::read_to_string(format!("{}_parsed.json", base)).unwrap();
        let back: ClusterMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("DMD_Cluster_0").unwrap(), ["A", "B"]);
    }

    #[test]
    fn malformed_input_writes_nothing() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("bad.uc");
        fs::write(&input, "H\t0\t1\t1\t+\t0\t0\t1M\thit\tseed\n").unwrap();
        let base = dir.path().join("bad").display().to_string();

        let mut a = args(input, Some(base.clone()));
        a.usearch = true;
        assert!(run(a).is_err());
        assert!(!PathBuf::from(format!("{}_parsed.txt", base)).exists());
        assert!(!PathBuf::from(format!("{}_parsed.json", base)).exists());
    }

    #[test]
    fn failed_write_leaves_no_partial_outputs() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("run.txt");
        fs::write(&input, "centroid\tmember\nA\tA\nA\tB\n").unwrap();
        let base = dir.path().join("run").display().to_string();
        // a directory where the JSON should go makes the last write fail
        fs::create_dir(format!("{}_parsed.json", base)).unwrap();

        let mut a = args(input, Some(base.clone()));
        a.diamond = true;
        assert!(run(a).is_err());
        assert!(!PathBuf::from(format!("{}_parsed.txt", base)).exists());
        assert!(!PathBuf::from(format!("{}_parsed_pivot.txt", base)).exists());
        // input + blocking directory, no leftover temp files
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
