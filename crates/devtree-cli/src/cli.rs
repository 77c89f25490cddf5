//! CLI argument parsing using clap derive

use clap::{Args, Parser, Subcommand, ValueEnum};
use devtree_core::RecordFamily;

/// devtree - Project platform packages onto a development directory tree
#[derive(Parser, Debug)]
#[command(name = "devtree")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Transfer configuration file (TOML, JSON or YAML)
    #[arg(short, long, global = true, env = "DEVTREE_CONFIG")]
    pub config: Option<String>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// What a package file holds.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackageType {
    /// Development components
    #[default]
    Standard,
    /// Wizards and wizard groups
    Wizards,
    /// Route templates with their groups and roles
    Routes,
}

impl PackageType {
    /// Record family of a reference-record package.
    pub fn family(self) -> Option<RecordFamily> {
        match self {
            Self::Standard => None,
            Self::Wizards => Some(RecordFamily::Wizards),
            Self::Routes => Some(RecordFamily::Routes),
        }
    }
}

/// Options shared by every pass.
///
/// Each one overrides the matching configuration value.
#[derive(Args, Debug, Clone, PartialEq, Eq, Default)]
pub struct RunArgs {
    /// Development root directory
    #[arg(short, long)]
    pub root: Option<String>,

    /// Codepage: russian, english or an encoding label such as windows-1251
    #[arg(long)]
    pub codepage: Option<String>,

    /// Number of kinds processed in parallel
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Restrict the pass to these kinds
    #[arg(short, long = "kind", value_delimiter = ',')]
    pub kinds: Vec<String>,

    /// Package type
    #[arg(short = 't', long = "type", value_enum, default_value_t)]
    pub package_type: PackageType,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Write a package into the development tree
    ///
    /// Examples:
    ///   devtree export package.xml --root dev
    ///   devtree export package.xml --root dev --kind Dialogs,Scripts
    ///   devtree export TipMarsh.xml --root dev --type routes
    Export {
        /// Package file to export
        package: String,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Rebuild a package from the development tree
    ///
    /// Without a selection every component is imported. An include list
    /// wins over history queries.
    ///
    /// Examples:
    ///   devtree import out.xml --root dev --include Dialogs/Main
    ///   devtree import out.xml --root dev --author alice --from 2024-01-01
    Import {
        /// Package file to write
        output: String,

        #[command(flatten)]
        run: RunArgs,

        /// Kind/Key subpaths to import
        #[arg(long, value_delimiter = ',')]
        include: Vec<String>,

        /// Changesets whose components are imported
        #[arg(long, value_delimiter = ',')]
        changesets: Vec<String>,

        /// Earliest commit date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        from: Option<String>,

        /// Latest commit date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        to: Option<String>,

        /// Commit author name
        #[arg(long)]
        author: Option<String>,

        /// Repository holding the history
        #[arg(long)]
        repository: Option<String>,

        /// Development root relative to the repository
        #[arg(long)]
        history_root: Option<String>,
    },

    /// Remove components no longer present in a record snapshot
    Delete {
        #[command(flatten)]
        run: RunArgs,

        /// Table dump describing the live records
        #[arg(short, long)]
        snapshot: Option<String>,
    },

    /// List the configured kinds with their folders
    Kinds,
}
