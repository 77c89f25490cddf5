//! Import filter
//!
//! Decides which component folders an import pass reads. The filter either
//! accepts everything or holds an allow-list of `Kind/Key` subpaths,
//! compared case-insensitively.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use devtree_fs::NormalizedPath;
use devtree_git::HistoryProvider;
use tracing::debug;

use crate::Result;

/// History slices selecting changed components.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub changesets: Vec<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub author: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportFilter {
    allowed: Option<BTreeSet<String>>,
}

impl ImportFilter {
    /// Accept every folder.
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Accept only the given `Kind/Key` subpaths.
    pub fn from_subpaths<I, S>(subpaths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = subpaths
            .into_iter()
            .map(|s| normalize(s.as_ref()))
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            allowed: Some(allowed),
        }
    }

    /// Accept components changed in the queried history.
    ///
    /// The allow-list is `changesets ∪ (date range ∩ author)`. A query part
    /// that is not given does not restrict; with no part given everything
    /// is accepted.
    pub fn from_history(
        provider: &dyn HistoryProvider,
        query: &HistoryQuery,
        history_root: &str,
    ) -> Result<Self> {
        let changesets = if query.changesets.is_empty() {
            None
        } else {
            Some(provider.resolve_changesets(&query.changesets)?)
        };
        let dated = if query.from.is_some() || query.to.is_some() {
            Some(provider.query_by_date_range(query.from, query.to)?)
        } else {
            None
        };
        let authored = match &query.author {
            Some(name) => Some(provider.query_by_author(name)?),
            None => None,
        };

        let to_subpaths = |paths: Option<BTreeSet<String>>| {
            paths.map(|paths| {
                paths
                    .iter()
                    .filter_map(|path| component_subpath(path, history_root))
                    .collect::<BTreeSet<_>>()
            })
        };
        let allowed = union(
            to_subpaths(changesets),
            intersect(to_subpaths(dated), to_subpaths(authored)),
        );
        if let Some(allowed) = &allowed {
            debug!(count = allowed.len(), "history selected components");
        }
        Ok(Self { allowed })
    }

    pub fn accepts_all(&self) -> bool {
        self.allowed.is_none()
    }

    /// Allowed subpaths, lowercased. `None` when everything is accepted.
    pub fn allowed(&self) -> Option<&BTreeSet<String>> {
        self.allowed.as_ref()
    }

    /// Whether the component folder `folder` below `root` takes part.
    pub fn need_import(&self, folder: &NormalizedPath, root: &NormalizedPath) -> bool {
        let Some(allowed) = &self.allowed else {
            return true;
        };
        folder
            .relative_to(root)
            .is_some_and(|relative| allowed.contains(&normalize(&relative)))
    }
}

fn normalize(subpath: &str) -> String {
    subpath
        .replace('\\', "/")
        .trim_matches('/')
        .to_lowercase()
}

/// The lowercased `Kind/Key` subpath of a repository path below
/// `history_root`. Paths outside the root or too short to name a component
/// yield `None`.
pub fn component_subpath(path: &str, history_root: &str) -> Option<String> {
    let path = normalize(path);
    let root = normalize(history_root);
    let relative = if root.is_empty() {
        path.as_str()
    } else {
        path.strip_prefix(&root)?.strip_prefix('/')?
    };

    let mut segments = relative.split('/').filter(|s| !s.is_empty());
    let kind = segments.next()?;
    let key = segments.next()?;
    Some(format!("{kind}/{key}"))
}

/// Intersection where an absent operand does not restrict.
pub fn intersect(
    a: Option<BTreeSet<String>>,
    b: Option<BTreeSet<String>>,
) -> Option<BTreeSet<String>> {
    match (a, b) {
        (None, other) | (other, None) => other,
        (Some(a), Some(b)) => Some(a.intersection(&b).cloned().collect()),
    }
}

/// Union where an absent operand contributes nothing.
pub fn union(a: Option<BTreeSet<String>>, b: Option<BTreeSet<String>>) -> Option<BTreeSet<String>> {
    match (a, b) {
        (None, other) | (other, None) => other,
        (Some(mut a), Some(b)) => {
            a.extend(b);
            Some(a)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("dev/Dialogs/Settings/Card.xml", "dev", Some("dialogs/settings"))]
    #[case("Dialogs/Settings/Events/Card.Open.isbl", "", Some("dialogs/settings"))]
    #[case("dev/PackageInfo.xml", "dev", None)]
    #[case("other/Dialogs/Settings/Card.xml", "dev", None)]
    #[case("devices/Dialogs/Settings/Card.xml", "dev", None)]
    fn subpath_below_root(#[case] path: &str, #[case] root: &str, #[case] expected: Option<&str>) {
        assert_eq!(component_subpath(path, root).as_deref(), expected);
    }

    #[test]
    fn need_import_ignores_case() {
        let root = NormalizedPath::new("/dev");
        let filter = ImportFilter::from_subpaths(["Dialogs/Settings"]);
        assert!(filter.need_import(&root.join("DIALOGS/settings"), &root));
        assert!(!filter.need_import(&root.join("Dialogs/Other"), &root));
        assert!(ImportFilter::accept_all().need_import(&root.join("Dialogs/Other"), &root));
    }
}
