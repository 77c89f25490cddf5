//! Directory projector
//!
//! Runs export, import and delete passes over the development root. Each
//! pass fans out one unit of work per entity kind onto a small worker pool;
//! within a kind, components are handled one after another.
//!
//! ```text
//! ComponentSet ──export──> <root>/<Kind>/<key>/Card.xml + side files
//! ComponentSet <──import── <root>/<Kind>/<key>/...   (guarded by ImportFilter)
//! RecordSource ──delete──> removes folders whose key is gone
//! ```

pub(crate) mod delete;
pub(crate) mod export;
mod grouped;
mod import;
pub(crate) mod pool;

use std::collections::BTreeMap;
use std::fmt;

use devtree_fs::{NormalizedPath, io};
use devtree_model::xml::package::{read_package_info, write_package_info};
use devtree_model::{Codepage, ComponentSet};
use serde::{Deserialize, Serialize};

use crate::filter::ImportFilter;
use crate::source::RecordSource;
use crate::{Kind, Result};

/// File name of a component's reduced header.
pub const HEADER_FILE: &str = "Card.xml";

/// Package metadata file at the development root.
pub const PACKAGE_INFO_FILE: &str = "PackageInfo.xml";

/// Run options of a projector pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectorOptions {
    /// Upper bound on worker threads.
    pub workers: usize,
    /// Kinds taking part; `None` means all of them.
    pub kinds: Option<Vec<Kind>>,
}

impl ProjectorOptions {
    /// Kinds taking part, in kind order.
    pub fn selected_kinds(&self) -> Vec<Kind> {
        match &self.kinds {
            Some(selected) => Kind::ALL
                .into_iter()
                .filter(|kind| selected.contains(kind))
                .collect(),
            None => Kind::ALL.to_vec(),
        }
    }
}

impl Default for ProjectorOptions {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            kinds: None,
        }
    }
}

/// Available parallelism, at least 1.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(usize::from)
        .unwrap_or(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Export,
    Import,
    Delete,
}

impl Stage {
    /// Past tense used in completion messages.
    pub fn verb(self) -> &'static str {
        match self {
            Self::Export => "exported",
            Self::Import => "imported",
            Self::Delete => "deleted",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Export => "export",
            Self::Import => "import",
            Self::Delete => "delete",
        })
    }
}

/// Per-kind counts of one pass.
///
/// Record passes count per record kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "K: Ord + Deserialize<'de>"))]
pub struct TransferReport<K: Ord = Kind> {
    pub stage: Stage,
    pub counts: BTreeMap<K, usize>,
}

impl<K: Ord> TransferReport<K> {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            counts: BTreeMap::new(),
        }
    }

    pub fn count(&self, kind: K) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Projects packages onto a development root and back.
///
/// The codepage is fixed for the projector's lifetime and passed to every
/// hook explicitly.
#[derive(Debug, Clone)]
pub struct Projector {
    root: NormalizedPath,
    codepage: Codepage,
    options: ProjectorOptions,
}

impl Projector {
    pub fn new(root: NormalizedPath, codepage: Codepage) -> Self {
        Self {
            root,
            codepage,
            options: ProjectorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ProjectorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    pub fn codepage(&self) -> Codepage {
        self.codepage
    }

    /// Kinds of this run in kind order.
    pub fn kinds(&self) -> Vec<Kind> {
        self.options.selected_kinds()
    }

    /// Write every selected kind of `set` below the root.
    ///
    /// Kinds that finished keep their output when a sibling kind fails.
    pub fn export(&self, set: &ComponentSet) -> Result<TransferReport> {
        io::ensure_dir(&self.root)?;
        let info = write_package_info(&set.info, self.codepage)?;
        io::write_if_changed(&self.root.join(PACKAGE_INFO_FILE), &info)?;

        let (report, _) = pool::run(
            Stage::Export,
            &self.kinds(),
            self.options.workers,
            |kind| Ok((export::export_kind(self, set, kind)?, ())),
        )?;
        Ok(report)
    }

    /// Read the components accepted by `filter` back into a package.
    pub fn import(&self, filter: &ImportFilter) -> Result<(ComponentSet, TransferReport)> {
        let (report, imported) = pool::run(
            Stage::Import,
            &self.kinds(),
            self.options.workers,
            |kind| {
                let components = import::import_kind(self, filter, kind)?;
                Ok((components.len(), components))
            },
        )?;

        let mut set = ComponentSet::new();
        if let Some(bytes) = io::read_optional(&self.root.join(PACKAGE_INFO_FILE))? {
            set.info = read_package_info(&bytes, self.codepage)?;
        }
        for (kind, components) in imported {
            set.group_mut(kind.group()).extend(components);
        }
        Ok((set, report))
    }

    /// Remove components that no longer exist at `source`.
    pub fn delete(&self, source: &dyn RecordSource) -> Result<TransferReport> {
        let (report, _) = pool::run(
            Stage::Delete,
            &self.kinds(),
            self.options.workers,
            |kind| Ok((delete::delete_kind(self, source, kind)?, ())),
        )?;
        Ok(report)
    }
}
