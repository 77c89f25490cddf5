//! Kinds command implementation

use colored::Colorize;
use devtree_core::TransferConfig;

/// Run the kinds command
///
/// Lists the kinds a pass would touch with their folders and package groups.
pub fn run_kinds(config: &TransferConfig) {
    let kinds = config.projector_options().selected_kinds();

    println!("{}", "Configured kinds".bold());
    for kind in &kinds {
        println!("   {:<22} {}", kind.folder().cyan(), kind.group());
    }
    println!();
    println!("Total: {} kinds", kinds.len());
}
