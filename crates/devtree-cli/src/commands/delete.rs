//! Delete command implementation

use colored::Colorize;
use devtree_core::{Projector, RecordProjector, SnapshotSource, TransferConfig};
use devtree_fs::NormalizedPath;

use super::print_report;
use crate::cli::PackageType;
use crate::error::{CliError, Result};
use crate::settings;

/// Run the delete command
///
/// Removes component folders whose records are missing from the snapshot.
pub fn run_delete(config: &TransferConfig, package_type: PackageType) -> Result<()> {
    let root = settings::development_root(config)?;
    let snapshot = config
        .source
        .snapshot
        .as_deref()
        .map(NormalizedPath::new)
        .ok_or_else(|| CliError::user("No record snapshot: pass --snapshot or set [source] snapshot"))?;
    let source = SnapshotSource::load(&snapshot)?;
    let codepage = settings::tree_codepage(config, &root)?;

    println!(
        "{} Removing components missing from {} under {}",
        "=>".blue().bold(),
        snapshot.as_str().cyan(),
        root.as_str().cyan()
    );

    if let Some(family) = package_type.family() {
        let projector = RecordProjector::new(root, codepage).with_workers(config.projector_options().workers);
        let report = projector.delete(family, &source)?;
        print_report(&report, "records");
        return Ok(());
    }

    let projector = Projector::new(root, codepage).with_options(config.projector_options());
    let report = projector.delete(&source)?;
    print_report(&report, "components");
    Ok(())
}
