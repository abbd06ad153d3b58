//! Presence/absence database (`ortho-db`).
//!
//! Combines `*_parsed_pivot.txt` tables from `parse` (and databases written by
//! earlier runs of this command) into one table keyed on the member id. Each
//! pivot table contributes one column, named after its file, holding the
//! cluster that member was assigned to; `-` marks absence.
//!
//! ### Example
//! ```text
//! orthokit ortho-db cdhit_parsed_pivot.txt usearch_parsed_pivot.txt -o ortho_db.txt
//! ```

use crate::error::OrthoError;
use crate::seqio::{file_stem_string, open_maybe_gz, timestamped_name, StagedOutput};
use anyhow::{Context, Result};
use clap::Args;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Name of the key column.
pub const QUERY: &str = "Query";
/// Cell value for a member absent from a source.
pub const ABSENT: &str = "-";

#[derive(Args, Debug, Clone)]
pub struct OrthoDbArgs {
    /// Pivot tables (*_parsed_pivot.txt) and/or existing databases
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output table (default: Orthology_Comparison_DB__<timestamp>.txt)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// A header plus rows; column 0 is the key once normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    fn index(&self) -> HashMap<&str, Vec<usize>> {
        let mut idx: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, row) in self.rows.iter().enumerate() {
            idx.entry(row[0].as_str()).or_default().push(i);
        }
        idx
    }

    fn render(&self) -> csv::Result<Vec<u8>> {
        let mut w = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        w.write_record(&self.columns)?;
        for row in &self.rows {
            w.write_record(row)?;
        }
        w.into_inner().map_err(|e| e.into_error().into())
    }
}

pub fn read_table(path: &Path) -> Result<Table, OrthoError> {
    let rdr = open_maybe_gz(path)?;
    let mut csv_rdr = csv::ReaderBuilder::new().delimiter(b'\t').has_headers(true).from_reader(rdr);
    let columns: Vec<String> = csv_rdr
        .headers()
        .map_err(|e| OrthoError::from_csv(path, e))?
        .iter()
        .map(String::from)
        .collect();
    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err(OrthoError::malformed(path, 1, "missing header row"));
    }
    let mut rows = Vec::new();
    for rec in csv_rdr.records() {
        let rec = rec.map_err(|e| OrthoError::from_csv(path, e))?;
        rows.push(rec.iter().map(String::from).collect());
    }
    Ok(Table { columns, rows })
}

/// Bring a table into database shape. A table already keyed on `Query` is
/// kept; a two-column pivot table `(cluster, member)` becomes
/// `(Query = member, <source> = cluster)`.
pub fn normalize(table: Table, source: &str, path: &Path) -> Result<Table, OrthoError> {
    if table.columns[0] == QUERY {
        return Ok(table);
    }
    if table.columns.len() != 2 {
        return Err(OrthoError::malformed(
            path,
            1,
            format!("expected a two-column pivot table or a `{}` database, found {} columns", QUERY, table.columns.len()),
        ));
    }
    let rows = table
        .rows
        .into_iter()
        .map(|mut r| {
            r.swap(0, 1);
            r
        })
        .collect();
    Ok(Table { columns: vec![QUERY.to_string(), source.to_string()], rows })
}

/// Full outer join on column 0; keys come out sorted. Keys repeated on one
/// side yield every pairing with the other side.
pub fn outer_join(left: &Table, right: &Table) -> Result<Table, OrthoError> {
    let seen: HashSet<&str> = left.columns[1..].iter().map(String::as_str).collect();
    if let Some(dup) = right.columns[1..].iter().find(|c| seen.contains(c.as_str())) {
        return Err(OrthoError::InvalidArguments(format!("column `{}` appears in more than one input", dup)));
    }

    let (li, ri) = (left.index(), right.index());
    let left_absent = vec![ABSENT.to_string(); left.columns.len() - 1];
    let right_absent = vec![ABSENT.to_string(); right.columns.len() - 1];

    let keys: BTreeSet<&str> = li.keys().chain(ri.keys()).copied().collect();
    let mut rows = Vec::new();
    for key in keys {
        let lefts: Vec<&[String]> = match li.get(key) {
            Some(ix) => ix.iter().map(|&i| &left.rows[i][1..]).collect(),
            None => vec![left_absent.as_slice()],
        };
        let rights: Vec<&[String]> = match ri.get(key) {
            Some(ix) => ix.iter().map(|&i| &right.rows[i][1..]).collect(),
            None => vec![right_absent.as_slice()],
        };
        for l in &lefts {
            for r in &rights {
                let mut row = Vec::with_capacity(1 + l.len() + r.len());
                row.push(key.to_string());
                row.extend(l.iter().cloned());
                row.extend(r.iter().cloned());
                rows.push(row);
            }
        }
    }

    let mut columns = left.columns.clone();
    columns.extend(right.columns[1..].iter().cloned());
    Ok(Table { columns, rows })
}

/// Execute the `ortho-db` subcommand.
pub fn run(args: OrthoDbArgs) -> Result<()> {
    let mut db: Option<Table> = None;
    for path in &args.inputs {
        let table = read_table(path).with_context(|| format!("Failed to read table {}", path.display()))?;
        let table = normalize(table, &file_stem_string(path), path)?;
        log::debug!("{}: {} rows, columns {:?}", path.display(), table.rows.len(), table.columns);
        db = Some(match db {
            None => table,
            Some(acc) => outer_join(&acc, &table)?,
        });
    }
    let db = db.context("No input tables given")?;

    let out = args.output.clone().unwrap_or_else(|| timestamped_name("Orthology_Comparison_DB__"));
    let bytes = db.render().context("Failed to render database")?;
    StagedOutput::rendered(&out, &bytes)?.persist()?;
    log::info!(
        "Wrote {} queries x {} sources to {}",
        db.rows.len(),
        db.columns.len() - 1,
        out.display()
    );
    Ok(())
}
