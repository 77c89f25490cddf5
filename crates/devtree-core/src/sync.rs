//! Directory synchronizer
//!
//! Keeps a component folder in lockstep with what the current export pass
//! wrote into it. Anything else found below the folder is deleted.

use std::collections::BTreeSet;

use devtree_fs::{NormalizedPath, io};
use tracing::debug;
use walkdir::WalkDir;

use crate::Result;

/// Paths written for one component during one export pass.
///
/// Recording a file also records every folder between it and the
/// component folder, so those folders survive pruning.
#[derive(Debug, Default, Clone)]
pub struct WriteSet {
    files: BTreeSet<NormalizedPath>,
    folders: BTreeSet<NormalizedPath>,
}

impl WriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.folders.clear();
    }

    pub fn record_file(&mut self, path: NormalizedPath) {
        if let Some(parent) = path.parent() {
            self.folders.insert(parent);
        }
        self.files.insert(path);
    }

    pub fn record_folder(&mut self, path: NormalizedPath) {
        self.folders.insert(path);
    }

    pub fn contains_file(&self, path: &NormalizedPath) -> bool {
        self.files.contains(path)
    }

    /// Whether `dir` is a written folder or an ancestor of one.
    pub fn keeps_folder(&self, dir: &NormalizedPath) -> bool {
        self.folders.iter().any(|folder| dir.contains(folder))
    }

    pub fn files(&self) -> impl Iterator<Item = &NormalizedPath> {
        self.files.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.folders.is_empty()
    }
}

/// Delete everything below `root` that `writes` does not account for.
///
/// Folders that lead to no written path are removed whole. Returns the
/// number of removed entries.
pub fn prune(root: &NormalizedPath, writes: &WriteSet) -> Result<usize> {
    let mut removed = 0;
    let mut walker = WalkDir::new(root.to_native()).min_depth(1).into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry?;
        let path = NormalizedPath::new(entry.path());

        if entry.file_type().is_dir() {
            if writes.keeps_folder(&path) {
                continue;
            }
            walker.skip_current_dir();
            io::remove_dir_all(&path)?;
            debug!(path = %path, "pruned folder");
            removed += 1;
        } else if !writes.contains_file(&path) {
            io::remove_file(&path)?;
            debug!(path = %path, "pruned file");
            removed += 1;
        }
    }
    Ok(removed)
}
