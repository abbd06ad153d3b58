//! Clustering-tool output readers.
//!
//! Every supported tool is described by a [`FormatDescriptor`]: a display
//! name (which also names the table columns), the prefix used for cluster
//! ids, and which [`Extraction`] strategy understands its file layout.
//! [`extract`] dispatches on the strategy and always yields a [`ClusterMap`].

use crate::clusters::{ClusterMap, ColumnLabels};
use crate::error::OrthoError;
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

/// Supported clustering tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterFormat {
    CdHit,
    Diamond,
    Mmseqs2,
    Usearch,
}

/// How cluster membership is laid out in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// `>Cluster N` boundary lines followed by member lines (CD-HIT `.clstr`).
    Boundary,
    /// Header row, then `centroid \t member` rows (Diamond, MMseqs2).
    CentroidTable,
    /// `.uc` records: `S` opens a cluster, `H` adds to it (USEARCH).
    SeedHit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    pub name: &'static str,
    pub id_prefix: &'static str,
    pub extraction: Extraction,
}

const CD_HIT: FormatDescriptor = FormatDescriptor { name: "CD-HIT", id_prefix: "CDH_", extraction: Extraction::Boundary };
const DIAMOND: FormatDescriptor = FormatDescriptor { name: "Diamond", id_prefix: "DMD_", extraction: Extraction::CentroidTable };
const MMSEQS2: FormatDescriptor = FormatDescriptor { name: "MMseqs2", id_prefix: "MMS_", extraction: Extraction::CentroidTable };
const USEARCH: FormatDescriptor = FormatDescriptor { name: "USEARCH", id_prefix: "USR_", extraction: Extraction::SeedHit };

impl ClusterFormat {
    pub fn descriptor(self) -> &'static FormatDescriptor {
        match self {
            ClusterFormat::CdHit => &CD_HIT,
            ClusterFormat::Diamond => &DIAMOND,
            ClusterFormat::Mmseqs2 => &MMSEQS2,
            ClusterFormat::Usearch => &USEARCH,
        }
    }
}

impl FormatDescriptor {
    pub fn labels(&self) -> ColumnLabels {
        ColumnLabels {
            id: format!("{}_ID", self.name),
            members: format!("{}_Members", self.name),
        }
    }

    /// `<prefix>Cluster_<n>`
    pub fn synthetic_id(&self, n: usize) -> String {
        format!("{}Cluster_{}", self.id_prefix, n)
    }
}

/// Read one clustering result from `reader`. `origin` only labels errors.
pub fn extract<R: BufRead>(format: ClusterFormat, reader: R, origin: &Path) -> Result<ClusterMap, OrthoError> {
    let desc = format.descriptor();
    let map = match desc.extraction {
        Extraction::Boundary => extract_boundary(desc, reader, origin)?,
        Extraction::CentroidTable => extract_centroid_table(desc, reader, origin)?,
        Extraction::SeedHit => extract_seed_hit(desc, reader, origin)?,
    };
    log::debug!(
        "{}: {} clusters, {} members from {}",
        desc.name,
        map.len(),
        map.total_members(),
        origin.display()
    );
    Ok(map)
}

/// Cluster being filled by a line-oriented reader.
enum ScanState {
    NoActiveCluster,
    InCluster { id: String, members: Vec<String>, opened_at: usize },
}

impl ScanState {
    /// Move the active cluster (if any) into `map`.
    fn finalize(&mut self, map: &mut ClusterMap, origin: &Path) -> Result<(), OrthoError> {
        if let ScanState::InCluster { id, members, opened_at } = std::mem::replace(self, ScanState::NoActiveCluster) {
            if members.is_empty() {
                return Err(OrthoError::malformed(origin, opened_at, format!("cluster `{}` has no members", id)));
            }
            if !map.insert(id.clone(), members) {
                return Err(OrthoError::malformed(origin, opened_at, format!("cluster id `{}` appears more than once", id)));
            }
        }
        Ok(())
    }

    fn push(&mut self, member: String) -> bool {
        match self {
            ScanState::InCluster { members, .. } => {
                members.push(member);
                true
            }
            ScanState::NoActiveCluster => false,
        }
    }
}

fn cd_hit_cluster_id(desc: &FormatDescriptor, boundary: &str) -> String {
    let name = boundary.trim().trim_start_matches('>');
    format!("{}{}", desc.id_prefix, name.replace(' ', "_"))
}

/// Accession from a CD-HIT member line such as
/// `0\t2799aa, >PF04998.17|RPOC2_CHLRE/275-3066... *`.
fn cd_hit_member(line: &str) -> Option<String> {
    let token = line
        .split_whitespace()
        .find(|t| t.starts_with('>'))
        .or_else(|| line.split(' ').nth(1))?;
    let acc = token.strip_prefix('>').unwrap_or(token);
    let acc = acc.trim_end_matches(|c: char| c.is_ascii_punctuation());
    if acc.is_empty() {
        None
    } else {
        Some(acc.to_string())
    }
}

fn extract_boundary<R: BufRead>(desc: &FormatDescriptor, reader: R, origin: &Path) -> Result<ClusterMap, OrthoError> {
    let mut map = ClusterMap::new();
    let mut state = ScanState::NoActiveCluster;

    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| OrthoError::unreadable(origin, e))?;
        let lineno = i + 1;
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with('>') {
            state.finalize(&mut map, origin)?;
            state = ScanState::InCluster { id: cd_hit_cluster_id(desc, &line), members: Vec::new(), opened_at: lineno };
            continue;
        }
        let member = cd_hit_member(line.trim())
            .ok_or_else(|| OrthoError::malformed(origin, lineno, "member line carries no accession"))?;
        if !state.push(member) {
            return Err(OrthoError::malformed(origin, lineno, "member line before the first `>Cluster` line"));
        }
    }
    state.finalize(&mut map, origin)?;
    Ok(map)
}

fn extract_centroid_table<R: BufRead>(desc: &FormatDescriptor, reader: R, origin: &Path) -> Result<ClusterMap, OrthoError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    // Groups in first-appearance order of their centroid.
    let mut groups: Vec<Vec<String>> = Vec::new();
    let mut rank: HashMap<String, usize> = HashMap::new();

    for rec in rdr.records() {
        let rec = rec.map_err(|e| OrthoError::from_csv(origin, e))?;
        let line = rec.position().map(|p| p.line() as usize).unwrap_or(0);
        let (centroid, member) = match (rec.get(0).map(str::trim), rec.get(1).map(str::trim)) {
            (Some(c), Some(m)) if !c.is_empty() && !m.is_empty() => (c, m),
            (Some(_), Some(_)) => return Err(OrthoError::malformed(origin, line, "empty centroid or member id")),
            _ => return Err(OrthoError::malformed(origin, line, "expected two tab-separated columns (centroid, member)")),
        };
        let g = *rank.entry(centroid.to_string()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[g].push(member.to_string());
    }

    let mut map = ClusterMap::new();
    for (i, members) in groups.into_iter().enumerate() {
        map.insert(desc.synthetic_id(i), members);
    }
    Ok(map)
}

/// 0-based column of the query/target label in a `.uc` record.
const UC_LABEL_FIELD: usize = 8;

fn extract_seed_hit<R: BufRead>(desc: &FormatDescriptor, reader: R, origin: &Path) -> Result<ClusterMap, OrthoError> {
    let mut map = ClusterMap::new();
    let mut state = ScanState::NoActiveCluster;
    let mut seeds = 0usize;

    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| OrthoError::unreadable(origin, e))?;
        let lineno = i + 1;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let kind = fields[0];
        if kind != "S" && kind != "H" {
            continue;
        }
        let label = fields
            .get(UC_LABEL_FIELD)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| OrthoError::malformed(origin, lineno, format!("{} record has no label in column {}", kind, UC_LABEL_FIELD + 1)))?;

        if kind == "S" {
            state.finalize(&mut map, origin)?;
            state = ScanState::InCluster {
                id: desc.synthetic_id(seeds),
                members: vec![label.to_string()],
                opened_at: lineno,
            };
            seeds += 1;
        } else if !state.push(label.to_string()) {
            return Err(OrthoError::malformed(origin, lineno, "H record before any S record"));
        }
    }
    state.finalize(&mut map, origin)?;
    Ok(map)
}
