//! Change-history provider trait

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::Result;

/// Source of changed file paths.
///
/// Paths are relative to the repository root and use forward slashes. Only
/// added and modified files are reported.
pub trait HistoryProvider {
    /// Paths changed by the given changesets.
    fn resolve_changesets(&self, ids: &[String]) -> Result<BTreeSet<String>>;

    /// Paths changed by changesets created in the inclusive range. An open
    /// bound does not restrict.
    fn query_by_date_range(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<BTreeSet<String>>;

    /// Paths changed by changesets of the given author.
    fn query_by_author(&self, name: &str) -> Result<BTreeSet<String>>;
}
