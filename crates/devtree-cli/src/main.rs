//! devtree CLI
//!
//! Exports platform packages into a development tree, imports them back
//! and prunes components the platform no longer has.

mod cli;
mod commands;
mod error;
mod settings;

use clap::Parser;
use colored::Colorize;
use devtree_fs::NormalizedPath;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flag
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(cli.verbose)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CliError::user(format!("Failed to set tracing subscriber: {e}")))?;
    tracing::debug!("Verbose mode enabled");

    match cli.command {
        Some(cmd) => execute_command(cli.config.as_deref(), cmd),
        None => {
            println!("{} directory projection for platform packages", "devtree".green().bold());
            println!();
            println!("Run {} for available commands.", "devtree --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(config_path: Option<&str>, cmd: Commands) -> Result<()> {
    let mut config = settings::load(config_path)?;
    match cmd {
        Commands::Export { package, run } => {
            settings::apply(&mut config, &run)?;
            commands::run_export(&config, &NormalizedPath::new(package), run.package_type)
        }
        Commands::Import {
            output,
            run,
            include,
            changesets,
            from,
            to,
            author,
            repository,
            history_root,
        } => {
            settings::apply(&mut config, &run)?;
            let import = &mut config.import;
            if !include.is_empty() {
                import.include = include;
            }
            if !changesets.is_empty() {
                import.changesets = changesets;
            }
            import.from = from.or(import.from.take());
            import.to = to.or(import.to.take());
            import.author = author.or(import.author.take());
            import.repository = repository.or(import.repository.take());
            import.history_root = history_root.or(import.history_root.take());
            commands::run_import(&config, &NormalizedPath::new(output), run.package_type)
        }
        Commands::Delete { run, snapshot } => {
            settings::apply(&mut config, &run)?;
            if snapshot.is_some() {
                config.source.snapshot = snapshot;
            }
            commands::run_delete(&config, run.package_type)
        }
        Commands::Kinds => {
            commands::run_kinds(&config);
            Ok(())
        }
    }
}
