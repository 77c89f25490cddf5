//! Record source
//!
//! The authoritative side of a delete pass. [`RecordSource`] is implemented
//! by whatever can enumerate the platform's records; [`SnapshotSource`]
//! reads them from a table dump on disk.

use std::collections::{BTreeMap, BTreeSet};

use devtree_fs::{ConfigStore, NormalizedPath};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::routing::{SourceTable, routing};
use crate::{Kind, Result};

/// One record as column/value pairs.
pub type SourceRow = BTreeMap<String, String>;

/// Trimmed key column values of one record, in key column order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordKey(pub Vec<String>);

impl RecordKey {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(values.into_iter().map(|v| v.as_ref().trim().to_string()).collect())
    }

    /// First key column, naming per-component folders.
    pub fn primary(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or_default()
    }
}

pub trait RecordSource: Send + Sync {
    /// Rows of `source.table` passing its filter.
    fn fetch_rows(&self, source: &SourceTable) -> Result<Vec<SourceRow>>;

    fn table_exists(&self, table: &str) -> Result<bool>;

    /// Keys of every row `source` selects.
    fn keys(&self, source: &SourceTable) -> Result<BTreeSet<RecordKey>> {
        let rows = self.fetch_rows(source)?;
        Ok(rows
            .iter()
            .map(|row| {
                RecordKey::new(
                    source
                        .key_columns
                        .iter()
                        .map(|column| row.get(*column).map(String::as_str).unwrap_or_default()),
                )
            })
            .collect())
    }

    /// Records of the kind's backing table that belong to the kind.
    fn fetch_relevant(&self, kind: Kind) -> Result<Vec<SourceRow>> {
        self.fetch_rows(&routing(kind).source)
    }

    /// Whether the kind's backing table exists at the source.
    fn record_exists(&self, kind: Kind) -> Result<bool> {
        self.table_exists(routing(kind).source.table)
    }

    /// Keys of every record of the kind.
    fn authoritative_keys(&self, kind: Kind) -> Result<BTreeSet<RecordKey>> {
        self.keys(&routing(kind).source)
    }
}

/// Table dump: `tables: { TableName: [ { column: value } ] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub tables: BTreeMap<String, Vec<SourceRow>>,
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    snapshot: Snapshot,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    /// Load a snapshot file. The format follows the extension.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        let snapshot: Snapshot = ConfigStore::new().load(path)?;
        debug!(path = %path, tables = snapshot.tables.len(), "loaded record snapshot");
        Ok(Self::new(snapshot))
    }
}

impl RecordSource for SnapshotSource {
    fn fetch_rows(&self, source: &SourceTable) -> Result<Vec<SourceRow>> {
        let Some(rows) = self.snapshot.tables.get(source.table) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .iter()
            .filter(|row| match source.filter {
                Some((column, value)) => row.get(column).is_some_and(|v| v.trim() == value),
                None => true,
            })
            .cloned()
            .collect())
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.snapshot.tables.contains_key(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> SourceRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn source() -> SnapshotSource {
        let mut snapshot = Snapshot::default();
        snapshot.tables.insert(
            "MBReports".into(),
            vec![
                row(&[("NameRpt", "Cleanup "), ("TypeRpt", "Function")]),
                row(&[("NameRpt", "Balance"), ("TypeRpt", "MBAnAccRpt")]),
            ],
        );
        SnapshotSource::new(snapshot)
    }

    #[test]
    fn rows_are_filtered_by_kind() {
        let keys = source().authoritative_keys(Kind::Scripts).unwrap();
        assert_eq!(keys, BTreeSet::from([RecordKey::new(["Cleanup"])]));
    }

    #[test]
    fn missing_table_is_reported() {
        let source = source();
        assert!(source.record_exists(Kind::Reports).unwrap());
        assert!(!source.record_exists(Kind::Dialogs).unwrap());
        assert!(source.fetch_relevant(Kind::Dialogs).unwrap().is_empty());
    }
}
