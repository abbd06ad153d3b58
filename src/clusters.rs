//! The canonical cluster mapping and its three output projections.
//!
//! A [`ClusterMap`] keeps clusters in first-appearance order. Every projection
//! walks that order, so the JSON document, the long (pivot) table and the wide
//! table all list clusters, and members within a cluster, identically.
//!
//! ### Projections
//! - **document**: `{"<id>": ["<member>", ...], ...}`
//! - **long**: `<id column>\t<members column>`, one row per (cluster, member)
//! - **wide**: `<id column>\t<members column>`, one row per cluster, members
//!   joined with [`WIDE_DELIMITER`]

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Separator between members in the wide table.
pub const WIDE_DELIMITER: &str = ",";

/// One cluster: its identifier and its members in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub id: String,
    pub members: Vec<String>,
}

/// Ordered mapping from cluster id to member list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterMap {
    clusters: Vec<Cluster>,
    index: HashMap<String, usize>,
}

/// Header labels for the two table projections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLabels {
    pub id: String,
    pub members: String,
}

impl ClusterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cluster. Returns `false` (and leaves the map untouched) if
    /// the id is already present.
    pub fn insert(&mut self, id: String, members: Vec<String>) -> bool {
        if self.index.contains_key(&id) {
            return false;
        }
        self.index.insert(id.clone(), self.clusters.len());
        self.clusters.push(Cluster { id, members });
        true
    }

    pub fn get(&self, id: &str) -> Option<&[String]> {
        self.index.get(id).map(|&i| self.clusters[i].members.as_slice())
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter()
    }

    /// Member-list sizes in cluster order.
    pub fn sizes(&self) -> Vec<usize> {
        self.clusters.iter().map(|c| c.members.len()).collect()
    }

    pub fn total_members(&self) -> usize {
        self.clusters.iter().map(|c| c.members.len()).sum()
    }

    /// Document form.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Long (pivot) form: one row per member.
    pub fn to_long_table(&self, labels: &ColumnLabels) -> csv::Result<Vec<u8>> {
        let mut w = table_writer();
        w.write_record([&labels.id, &labels.members])?;
        for c in &self.clusters {
            for m in &c.members {
                w.write_record([&c.id, m])?;
            }
        }
        w.into_inner().map_err(|e| e.into_error().into())
    }

    /// Wide form: one row per cluster, members joined by [`WIDE_DELIMITER`].
    pub fn to_wide_table(&self, labels: &ColumnLabels) -> csv::Result<Vec<u8>> {
        let mut w = table_writer();
        w.write_record([&labels.id, &labels.members])?;
        for c in &self.clusters {
            w.write_record([c.id.as_str(), c.members.join(WIDE_DELIMITER).as_str()])?;
        }
        w.into_inner().map_err(|e| e.into_error().into())
    }
}

fn table_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

impl Serialize for ClusterMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.clusters.len()))?;
        for c in &self.clusters {
            map.serialize_entry(&c.id, &c.members)?;
        }
        map.end()
    }
}

struct ClusterMapVisitor;

impl<'de> Visitor<'de> for ClusterMapVisitor {
    type Value = ClusterMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping cluster ids to arrays of member ids")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ClusterMap, A::Error> {
        let mut out = ClusterMap::new();
        while let Some((id, members)) = access.next_entry::<String, Vec<String>>()? {
            if !out.insert(id.clone(), members) {
                return Err(de::Error::custom(format!("duplicate cluster id `{}`", id)));
            }
        }
        Ok(out)
    }
}

impl<'de> Deserialize<'de> for ClusterMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ClusterMapVisitor)
    }
}
