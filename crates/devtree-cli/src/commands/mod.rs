//! Command implementations

pub mod delete;
pub mod export;
pub mod import;
pub mod kinds;

pub use delete::run_delete;
pub use export::run_export;
pub use import::run_import;
pub use kinds::run_kinds;

use std::fmt;

use colored::Colorize;
use devtree_core::TransferReport;

/// Print the per-kind counts of a pass, then its total.
fn print_report<K: Ord + fmt::Display>(report: &TransferReport<K>, noun: &str) {
    for (kind, count) in report.counts.iter().filter(|(_, count)| **count > 0) {
        println!("   {:<22} {}", kind.to_string(), count);
    }
    println!(
        "{} {} {} {noun}",
        "OK".green().bold(),
        capitalized(report.stage.verb()),
        report.total()
    );
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
