use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use devtree_fs::NormalizedPath;
use devtree_git::{Error, GitHistoryProvider, HistoryProvider};
use devtree_test_utils::git::{commit_files, init_repo};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const DAY: i64 = 24 * 60 * 60;
const START: i64 = 1_700_000_000;

fn set(paths: &[&str]) -> BTreeSet<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

/// Three commits: alice on day 0 and day 2, bob on day 1.
fn history() -> (TempDir, GitHistoryProvider, Vec<String>) {
    let dir = TempDir::new().unwrap();
    let repo = init_repo(dir.path());
    let first = commit_files(
        &repo,
        &[("dev/Dialogs/D1/Card.xml", "<Dialog/>")],
        "alice",
        START,
    );
    let second = commit_files(
        &repo,
        &[("dev/Scripts/S1/Text.isbl", "Run()")],
        "bob",
        START + DAY,
    );
    let third = commit_files(
        &repo,
        &[
            ("dev/Dialogs/D1/Card.xml", "<Dialog KeyValue=\"D1\"/>"),
            ("dev/Functions/F1/Text.isbl", "Sum()"),
        ],
        "alice",
        START + 2 * DAY,
    );
    let provider = GitHistoryProvider::open(NormalizedPath::new(dir.path())).unwrap();
    let ids = [first, second, third].iter().map(|id| id.to_string()).collect();
    (dir, provider, ids)
}

#[test]
fn test_changesets_resolve_to_changed_paths() {
    let (_dir, provider, ids) = history();

    let paths = provider.resolve_changesets(&ids[1..2]).unwrap();

    assert_eq!(paths, set(&["dev/Scripts/S1/Text.isbl"]));
}

#[test]
fn test_modified_files_count_as_changed() {
    let (_dir, provider, ids) = history();

    let paths = provider.resolve_changesets(&ids[2..]).unwrap();

    assert_eq!(
        paths,
        set(&["dev/Dialogs/D1/Card.xml", "dev/Functions/F1/Text.isbl"])
    );
}

#[test]
fn test_date_range_is_inclusive() {
    let (_dir, provider, _) = history();
    let from = Utc.timestamp_opt(START + DAY, 0).unwrap();

    let paths = provider.query_by_date_range(Some(from), None).unwrap();

    assert_eq!(
        paths,
        set(&[
            "dev/Dialogs/D1/Card.xml",
            "dev/Functions/F1/Text.isbl",
            "dev/Scripts/S1/Text.isbl",
        ])
    );
}

#[test]
fn test_date_range_upper_bound() {
    let (_dir, provider, _) = history();
    let to = Utc.timestamp_opt(START + DAY / 2, 0).unwrap();

    let paths = provider.query_by_date_range(None, Some(to)).unwrap();

    assert_eq!(paths, set(&["dev/Dialogs/D1/Card.xml"]));
}

#[test]
fn test_author_matches_name_or_email() {
    let (_dir, provider, _) = history();

    let by_name = provider.query_by_author("bob").unwrap();
    let by_email = provider.query_by_author("bob@example.com").unwrap();

    assert_eq!(by_name, set(&["dev/Scripts/S1/Text.isbl"]));
    assert_eq!(by_email, by_name);
    assert!(provider.query_by_author("carol").unwrap().is_empty());
}

#[test]
fn test_unknown_revision_is_error() {
    let (_dir, provider, _) = history();

    let result = provider.resolve_changesets(&["no-such-revision".to_string()]);

    assert!(matches!(result, Err(Error::RevisionNotFound { .. })));
}

#[test]
fn test_empty_repository_has_no_history() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    let provider = GitHistoryProvider::open(NormalizedPath::new(dir.path())).unwrap();

    assert!(provider.query_by_author("alice").unwrap().is_empty());
    assert!(provider.query_by_date_range(None, None).unwrap().is_empty());
}

#[test]
fn test_open_outside_repository_fails() {
    let dir = TempDir::new().unwrap();

    let result = GitHistoryProvider::open(NormalizedPath::new(dir.path()));

    assert!(matches!(result, Err(Error::Git(_))));
}
