//! Delete pass of one kind

use std::collections::BTreeSet;

use devtree_fs::{NormalizedPath, escape, io};
use tracing::{debug, warn};

use super::{Projector, Stage, grouped};
use crate::routing::{Policy, routing};
use crate::source::{RecordKey, RecordSource};
use crate::{Kind, Result};

/// Remove component folders whose key `source` no longer lists.
/// Returns the number of removed components.
pub(super) fn delete_kind(projector: &Projector, source: &dyn RecordSource, kind: Kind) -> Result<usize> {
    let config = routing(kind);
    if config.source.check_exists && !source.record_exists(kind)? {
        warn!(
            "{} {kind}: skipped, table {} does not exist",
            Stage::Delete,
            config.source.table
        );
        return Ok(0);
    }

    let keys = source.authoritative_keys(kind)?;
    let kind_folder = config.folder(projector.root());
    if config.policy == Policy::Grouped {
        return grouped::delete(&config, &keys, &kind_folder, projector.codepage());
    }

    remove_unlisted(&kind_folder, &keys)
}

/// Remove the subfolders of `parent` that no key names.
///
/// Folder names compare case-insensitively against escaped primary keys.
pub(crate) fn remove_unlisted(parent: &NormalizedPath, keys: &BTreeSet<RecordKey>) -> Result<usize> {
    let live: BTreeSet<String> = keys
        .iter()
        .map(|key| escape(key.primary()).trim().to_lowercase())
        .collect();

    let mut deleted = 0;
    for folder in io::list_subdirs(parent)? {
        let name = folder.file_name().unwrap_or_default().to_lowercase();
        if live.contains(&name) {
            continue;
        }
        io::remove_dir_all(&folder)?;
        debug!(folder = %folder, "deleted component");
        deleted += 1;
    }
    Ok(deleted)
}
