//! Repograph CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "repograph")]
#[command(about = "Deterministic repository knowledge-graph builder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file
    #[arg(short, long, global = true, default_value = repograph_builder::CONFIG_FILE)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a graph from collaborator records and persist it
    Build {
        /// JSON file holding the run's normalized records
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory (overrides the config file)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Validate a persisted linked-data graph
    Validate {
        graph: PathBuf,
    },
    /// Diff two persisted linked-data graphs
    Diff {
        previous: PathBuf,
        current: PathBuf,
    },
    /// Clear the snapshot cache
    Clear,
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "repograph={lvl},repograph_core={lvl},repograph_builder={lvl}",
            lvl = log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::debug!("Repograph v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Build { input, out } => commands::build(&cli.config, input, out),
        Commands::Validate { graph } => commands::validate(graph),
        Commands::Diff { previous, current } => commands::diff(previous, current),
        Commands::Clear => commands::clear(&cli.config),
        Commands::Version => {
            println!("Repograph v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
