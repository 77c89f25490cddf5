//! Resolve a run's settings from the configuration file and flags

use devtree_core::{Kind, RecordFamily, TransferConfig};
use devtree_fs::NormalizedPath;
use devtree_fs::io;
use devtree_model::Codepage;
use devtree_model::xml::declared_codepage;

use crate::cli::RunArgs;
use crate::error::{CliError, Result};

/// Load the configuration file, or defaults when none was given.
pub fn load(path: Option<&str>) -> Result<TransferConfig> {
    match path {
        Some(path) => Ok(TransferConfig::load(&NormalizedPath::new(path))?),
        None => Ok(TransferConfig::default()),
    }
}

/// Overlay command-line flags onto `config`.
pub fn apply(config: &mut TransferConfig, run: &RunArgs) -> Result<()> {
    if let Some(root) = &run.root {
        config.development_root = Some(root.clone());
    }
    if let Some(codepage) = &run.codepage {
        config.codepage = Some(parse_codepage(codepage)?);
    }
    if let Some(workers) = run.workers {
        config.workers = Some(workers);
    }
    if !run.kinds.is_empty() {
        let kinds = run
            .kinds
            .iter()
            .map(|name| name.parse::<Kind>())
            .collect::<devtree_core::Result<Vec<_>>>()?;
        config.kinds = Some(kinds);
    }
    Ok(())
}

pub fn parse_codepage(value: &str) -> Result<Codepage> {
    match value.trim().to_lowercase().as_str() {
        "russian" => Ok(Codepage::Russian),
        "english" => Ok(Codepage::English),
        label => Codepage::from_label(label)
            .ok_or_else(|| CliError::user(format!("Unknown codepage: {value}"))),
    }
}

/// The configured development root, resolved to an absolute path.
pub fn development_root(config: &TransferConfig) -> Result<NormalizedPath> {
    config
        .development_root
        .as_deref()
        .map(NormalizedPath::canonical)
        .ok_or_else(|| {
            CliError::user("No development root: pass --root or set development_root")
        })
}

/// Codepage for passes that start from the tree.
///
/// The configured codepage wins, then the one `PackageInfo.xml` declares.
pub fn tree_codepage(config: &TransferConfig, root: &NormalizedPath) -> Result<Codepage> {
    if let Some(codepage) = config.codepage {
        return Ok(codepage);
    }
    let info = io::read_optional(&root.join(devtree_core::projector::PACKAGE_INFO_FILE))?;
    Ok(info
        .as_deref()
        .and_then(declared_codepage)
        .unwrap_or_default())
}

/// Codepage of a record family's files.
///
/// The codepage the first existing record file declares wins, then the
/// configured one.
pub fn record_codepage(config: &TransferConfig, family: RecordFamily, package: &NormalizedPath) -> Result<Codepage> {
    for kind in family.kinds() {
        let declared = io::read_optional(&kind.record_file(package))?
            .as_deref()
            .and_then(declared_codepage);
        if let Some(codepage) = declared {
            return Ok(codepage);
        }
    }
    Ok(config.codepage.unwrap_or_default())
}
