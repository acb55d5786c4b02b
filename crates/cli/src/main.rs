//! Shelve CLI
//!
//! Checks storage policy configurations, explains what they compile to and
//! dry-runs them against entry metadata. Actions are never executed.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use shelve_policy_yaml::{ConfigLoader, LoaderConfig};
use tracing_subscriber::{EnvFilter, fmt};

/// Shelve CLI, check and dry-run storage policies.
#[derive(Parser, Debug)]
#[command(name = "shelve", version, about)]
struct Cli {
    /// Directory searched for configuration names.
    #[arg(
        long,
        env = "SHELVE_CONFIG_DIR",
        default_value = "/etc/shelve.d",
        global = true
    )]
    config_dir: PathBuf,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a configuration and report what it declares.
    Check(commands::check::CheckArgs),
    /// Show the conditions of policies and the filters they compile to.
    Explain(commands::explain::ExplainArgs),
    /// Decide the action of each policy for a list of entries.
    Evaluate(commands::evaluate::EvaluateArgs),
}

fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let loader = ConfigLoader::new(LoaderConfig {
        config_dir: cli.config_dir.clone(),
        ..LoaderConfig::default()
    });

    match cli.command {
        Command::Check(args) => commands::check::run(&loader, &args, &cli.format),
        Command::Explain(args) => commands::explain::run(&loader, &args, &cli.format),
        Command::Evaluate(args) => commands::evaluate::run(&loader, &args, &cli.format),
    }
}
