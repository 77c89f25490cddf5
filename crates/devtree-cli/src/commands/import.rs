//! Import command implementation

use colored::Colorize;
use devtree_core::{Projector, RecordProjector, TransferConfig};
use devtree_fs::{NormalizedPath, io};
use devtree_model::xml::package::write_package;

use super::print_report;
use crate::cli::PackageType;
use crate::error::Result;
use crate::settings;

/// Run the import command
///
/// Rebuilds a package from the components the configured filter accepts
/// and writes it to `output`. Record packages rewrite every record file of
/// their family next to `output`.
pub fn run_import(config: &TransferConfig, output: &NormalizedPath, package_type: PackageType) -> Result<()> {
    let root = settings::development_root(config)?;
    let codepage = settings::tree_codepage(config, &root)?;
    let filter = config.import_filter()?;

    match filter.allowed() {
        Some(allowed) => println!(
            "{} Importing {} selected components from {}",
            "=>".blue().bold(),
            allowed.len(),
            root.as_str().cyan()
        ),
        None => println!(
            "{} Importing all components from {}",
            "=>".blue().bold(),
            root.as_str().cyan()
        ),
    }

    if let Some(family) = package_type.family() {
        let output = NormalizedPath::canonical(output.as_str());
        let projector = RecordProjector::new(root, codepage).with_workers(config.projector_options().workers);
        let report = projector.import(family, &filter, &output)?;
        print_report(&report, "records");
        println!("   {} records written beside {}", family, output.as_str().cyan());
        return Ok(());
    }

    let projector = Projector::new(root, codepage).with_options(config.projector_options());
    let (set, report) = projector.import(&filter)?;
    io::write_atomic(output, &write_package(&set, codepage)?)?;

    print_report(&report, "components");
    println!("   Package written to {}", output.as_str().cyan());
    Ok(())
}
