//! Git-backed change history

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use devtree_fs::NormalizedPath;
use git2::{Commit, Delta, Repository};
use tracing::debug;

use crate::provider::HistoryProvider;
use crate::{Error, Result};

/// Number of most recent commits searched by date and author queries.
pub const COMMIT_WINDOW: usize = 500;

/// Parse `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::InvalidDate {
            value: value.to_string(),
        })
}

/// History provider reading commits of a local git repository.
///
/// Changesets are revisions (`revparse` syntax). Date and author queries
/// walk the most recent [`COMMIT_WINDOW`] commits reachable from HEAD.
pub struct GitHistoryProvider {
    root: NormalizedPath,
}

impl GitHistoryProvider {
    /// Open the repository at `root`.
    pub fn open(root: NormalizedPath) -> Result<Self> {
        Repository::open(root.to_native())?;
        Ok(Self { root })
    }

    fn repository(&self) -> Result<Repository> {
        Ok(Repository::open(self.root.to_native())?)
    }

    /// Walk recent commits and collect paths of those matching `keep`.
    fn collect_recent<F>(&self, keep: F) -> Result<BTreeSet<String>>
    where
        F: Fn(&Commit<'_>) -> bool,
    {
        let repo = self.repository()?;
        let mut paths = BTreeSet::new();
        if repo.is_empty()? {
            return Ok(paths);
        }

        let mut revwalk = repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(git2::Sort::TIME)?;

        for oid in revwalk.take(COMMIT_WINDOW) {
            let commit = repo.find_commit(oid?)?;
            if keep(&commit) {
                paths.extend(changed_paths(&repo, &commit)?);
            }
        }
        Ok(paths)
    }
}

fn commit_time(commit: &Commit<'_>) -> DateTime<Utc> {
    Utc.timestamp_opt(commit.time().seconds(), 0)
        .single()
        .unwrap_or_default()
}

/// Added and modified paths of `commit` against its first parent.
fn changed_paths(repo: &Repository, commit: &Commit<'_>) -> Result<Vec<String>> {
    let tree = commit.tree()?;
    let parent_tree = match commit.parent(0) {
        Ok(parent) => Some(parent.tree()?),
        Err(_) => None,
    };
    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

    let paths = diff
        .deltas()
        .filter(|delta| {
            matches!(
                delta.status(),
                Delta::Added | Delta::Modified | Delta::Renamed | Delta::Copied
            )
        })
        .filter_map(|delta| delta.new_file().path())
        .map(|path| path.to_string_lossy().replace('\\', "/"))
        .collect::<Vec<_>>();
    debug!(commit = %commit.id(), count = paths.len(), "collected changed paths");
    Ok(paths)
}

impl HistoryProvider for GitHistoryProvider {
    fn resolve_changesets(&self, ids: &[String]) -> Result<BTreeSet<String>> {
        let repo = self.repository()?;
        let mut paths = BTreeSet::new();
        for id in ids {
            let commit = repo
                .revparse_single(id.trim())
                .and_then(|object| object.peel_to_commit())
                .map_err(|_| Error::RevisionNotFound {
                    revision: id.clone(),
                })?;
            paths.extend(changed_paths(&repo, &commit)?);
        }
        Ok(paths)
    }

    fn query_by_date_range(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<BTreeSet<String>> {
        self.collect_recent(|commit| {
            let time = commit_time(commit);
            from.is_none_or(|from| time >= from) && to.is_none_or(|to| time <= to)
        })
    }

    fn query_by_author(&self, name: &str) -> Result<BTreeSet<String>> {
        self.collect_recent(|commit| {
            let author = commit.author();
            author.name() == Some(name) || author.email() == Some(name)
        })
    }
}
