//! Git repository fixtures with controlled history.
//!
//! History queries filter by author and commit time, so every commit made
//! here carries an explicit signature instead of the ambient git config.

use std::fs;
use std::path::Path;

use git2::{Oid, Repository, Signature, Time};

/// Initialises an empty git repository using `git2`.
///
/// # Panics
/// Panics if `git2::Repository::init` fails.
pub fn init_repo(path: &Path) -> Repository {
    Repository::init(path).unwrap_or_else(|e| {
        panic!(
            "init_repo: failed to init repository at {}: {e}",
            path.display()
        )
    })
}

/// Writes `files` into the working tree and commits them on HEAD.
///
/// `files` are `(relative path, content)` pairs with forward slashes. The
/// commit is authored by `author` (email `<author>@example.com`) at
/// `seconds` since the Unix epoch.
///
/// # Panics
/// Panics if any filesystem or git operation fails.
pub fn commit_files(repo: &Repository, files: &[(&str, &str)], author: &str, seconds: i64) -> Oid {
    let workdir = repo
        .workdir()
        .unwrap_or_else(|| panic!("commit_files: repository has no working directory"))
        .to_path_buf();
    let mut index = repo
        .index()
        .unwrap_or_else(|e| panic!("commit_files: failed to open index: {e}"));

    for (relative, content) in files {
        let full = workdir.join(relative);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("commit_files: failed to create {}: {e}", parent.display())
            });
        }
        fs::write(&full, content)
            .unwrap_or_else(|e| panic!("commit_files: failed to write {relative}: {e}"));
        index
            .add_path(Path::new(relative))
            .unwrap_or_else(|e| panic!("commit_files: failed to stage {relative}: {e}"));
    }
    index
        .write()
        .unwrap_or_else(|e| panic!("commit_files: failed to write index: {e}"));

    let tree_id = index
        .write_tree()
        .unwrap_or_else(|e| panic!("commit_files: failed to write tree: {e}"));
    let tree = repo
        .find_tree(tree_id)
        .unwrap_or_else(|e| panic!("commit_files: failed to find tree: {e}"));

    let email = format!("{}@example.com", author.to_lowercase());
    let signature = Signature::new(author, &email, &Time::new(seconds, 0))
        .unwrap_or_else(|e| panic!("commit_files: invalid signature for {author}: {e}"));

    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();
    let message = format!("Update {} file(s)", files.len());

    repo.commit(Some("HEAD"), &signature, &signature, &message, &tree, &parents)
        .unwrap_or_else(|e| panic!("commit_files: failed to commit: {e}"))
}
