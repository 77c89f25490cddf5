//! Transfer configuration
//!
//! One file describes a run: where the development root is, which kinds
//! take part and how an import selects components. Any format
//! [`ConfigStore`] understands works:
//!
//! ```toml
//! development_root = "dev"
//! codepage = "russian"
//! workers = 4
//! kinds = ["Dialogs", "Scripts"]
//!
//! [import]
//! changesets = ["HEAD~2"]
//! author = "alice"
//! repository = "."
//! history_root = "dev"
//!
//! [source]
//! snapshot = "records.yaml"
//! ```

use devtree_fs::{ConfigStore, NormalizedPath};
use devtree_git::{GitHistoryProvider, parse_date};
use devtree_model::Codepage;
use serde::{Deserialize, Serialize};

use crate::filter::{HistoryQuery, ImportFilter};
use crate::projector::{ProjectorOptions, default_workers};
use crate::{Kind, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub development_root: Option<String>,
    /// Defaults to the package declaration.
    pub codepage: Option<Codepage>,
    pub workers: Option<usize>,
    pub kinds: Option<Vec<Kind>>,
    pub import: ImportSection,
    pub source: SourceSection,
}

/// How an import selects components.
///
/// An `include` list wins over history queries. Without either, every
/// component is imported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSection {
    /// `Kind/Key` subpaths.
    pub include: Vec<String>,
    pub changesets: Vec<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub author: Option<String>,
    /// Repository holding the history. Defaults to the development root.
    pub repository: Option<String>,
    /// Development root relative to the repository.
    pub history_root: Option<String>,
}

impl ImportSection {
    pub fn uses_history(&self) -> bool {
        !self.changesets.is_empty()
            || self.from.is_some()
            || self.to.is_some()
            || self.author.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    /// Table dump read by the delete pass.
    pub snapshot: Option<String>,
}

impl TransferConfig {
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        Ok(ConfigStore::new().load(path)?)
    }

    pub fn projector_options(&self) -> ProjectorOptions {
        ProjectorOptions {
            workers: self.workers.unwrap_or_else(default_workers).max(1),
            kinds: self.kinds.clone(),
        }
    }

    pub fn history_query(&self) -> Result<HistoryQuery> {
        let date = |value: &Option<String>| value.as_deref().map(parse_date).transpose();
        Ok(HistoryQuery {
            changesets: self.import.changesets.clone(),
            from: date(&self.import.from)?,
            to: date(&self.import.to)?,
            author: self.import.author.clone(),
        })
    }

    /// Build the import filter, opening the history repository if needed.
    pub fn import_filter(&self) -> Result<ImportFilter> {
        if !self.import.include.is_empty() {
            return Ok(ImportFilter::from_subpaths(&self.import.include));
        }
        if !self.import.uses_history() {
            return Ok(ImportFilter::accept_all());
        }

        let repository = self
            .import
            .repository
            .as_deref()
            .or(self.development_root.as_deref())
            .unwrap_or(".");
        let provider = GitHistoryProvider::open(NormalizedPath::new(repository))?;
        let history_root = self.import.history_root.as_deref().unwrap_or_default();
        ImportFilter::from_history(&provider, &self.history_query()?, history_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn loads_toml_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = NormalizedPath::new(dir.path().join("transfer.toml"));
        std::fs::write(
            path.to_native(),
            "codepage = \"english\"\nkinds = [\"Dialogs\"]\n[import]\ninclude = [\"Dialogs/Main\"]\n",
        )
        .unwrap();

        let config = TransferConfig::load(&path).unwrap();

        assert_eq!(config.codepage, Some(Codepage::English));
        assert_eq!(config.kinds, Some(vec![Kind::Dialogs]));
        assert_eq!(config.import.include, vec!["Dialogs/Main"]);
        assert_eq!(config.source, SourceSection::default());
    }

    #[test]
    fn include_list_wins_over_history() {
        let config = TransferConfig {
            import: ImportSection {
                include: vec!["Dialogs/Main".into()],
                author: Some("alice".into()),
                repository: Some("/nonexistent".into()),
                ..ImportSection::default()
            },
            ..TransferConfig::default()
        };
        let filter = config.import_filter().unwrap();
        assert!(!filter.accepts_all());
    }

    #[test]
    fn no_selection_accepts_all() {
        let filter = TransferConfig::default().import_filter().unwrap();
        assert!(filter.accepts_all());
    }

    #[test]
    fn bad_date_is_rejected() {
        let config = TransferConfig {
            import: ImportSection {
                from: Some("yesterday".into()),
                ..ImportSection::default()
            },
            ..TransferConfig::default()
        };
        assert!(config.history_query().is_err());
    }

    #[test]
    fn workers_are_at_least_one() {
        let config = TransferConfig {
            workers: Some(0),
            ..TransferConfig::default()
        };
        assert_eq!(config.projector_options().workers, 1);
    }
}
