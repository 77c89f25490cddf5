//! Export command implementation

use colored::Colorize;
use devtree_core::{Projector, RecordFamily, RecordProjector, TransferConfig};
use devtree_fs::{NormalizedPath, io};
use devtree_model::xml::package::read_package;

use super::print_report;
use crate::cli::PackageType;
use crate::error::Result;
use crate::settings;

/// Run the export command
///
/// Reads `package` and writes its components below the development root.
/// A codepage declared by the package wins over the configured one.
pub fn run_export(config: &TransferConfig, package: &NormalizedPath, package_type: PackageType) -> Result<()> {
    if let Some(family) = package_type.family() {
        return export_records(config, family, package);
    }

    let root = settings::development_root(config)?;
    let bytes = io::read_bytes(package)?;
    let (set, codepage) = read_package(&bytes, config.codepage.unwrap_or_default())?;

    println!(
        "{} Exporting {} components from {} into {} ({})",
        "=>".blue().bold(),
        set.len(),
        package.as_str().cyan(),
        root.as_str().cyan(),
        codepage.label()
    );

    let projector = Projector::new(root, codepage).with_options(config.projector_options());
    let report = projector.export(&set)?;
    print_report(&report, "components");
    Ok(())
}

fn export_records(config: &TransferConfig, family: RecordFamily, package: &NormalizedPath) -> Result<()> {
    let root = settings::development_root(config)?;
    let package = NormalizedPath::canonical(package.as_str());
    let codepage = settings::record_codepage(config, family, &package)?;

    println!(
        "{} Exporting {} records from {} into {} ({})",
        "=>".blue().bold(),
        family,
        package.as_str().cyan(),
        root.as_str().cyan(),
        codepage.label()
    );

    let projector = RecordProjector::new(root, codepage).with_workers(config.projector_options().workers);
    let report = projector.export(family, &package)?;
    print_report(&report, "records");
    Ok(())
}
