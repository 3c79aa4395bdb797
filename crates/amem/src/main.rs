//! amem - agentic memory graph
//!
//! Main entry point for the amem CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;

mod commands;
mod setup;

use amem_config::{AmemConfig, LoggingConfig};
use commands::{config, repl, run};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// amem - self-organizing associative memory with spreading-activation recall
#[derive(Parser)]
#[command(name = "amem")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of discovering it
    #[arg(long, global = true, env = "AMEM_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive session over an in-memory graph
    Repl(repl::ReplArgs),

    /// Execute a script of session commands
    Run(run::RunArgs),

    /// Show the effective configuration
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources, warnings) = match &cli.config {
        Some(path) => (
            amem_config::load_config_file(path)?,
            vec![path.clone()],
            Vec::new(),
        ),
        None => {
            let loaded = amem_config::load_config(None)?;
            let sources = loaded
                .loaded_from()
                .into_iter()
                .map(|p| p.to_path_buf())
                .collect();
            (loaded.config, sources, loaded.warnings)
        }
    };

    let _guard = init_tracing(cli.verbose, &config.logging());
    for warning in &warnings {
        warn!("{}", warning);
    }

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
        config,
        sources,
    };

    match cli.command {
        Commands::Repl(args) => repl::run(args, &ctx).await,
        Commands::Run(args) => run::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}

/// Console (human-readable, stderr) plus optional rotating JSON file.
fn init_tracing(verbose: bool, logging: &LoggingConfig) -> Option<WorkerGuard> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = if verbose {
        "amem=debug,amem_memory=debug,amem_llm=debug,amem_config=debug,info"
    } else {
        "amem=info,amem_memory=info,amem_llm=info,warn"
    };

    let (file_layer, guard) = if logging.file {
        let log_dir = logging
            .directory
            .clone()
            .or_else(|| amem_config::xdg_config_dir().map(|d| d.join("logs")))
            .unwrap_or_else(|| PathBuf::from("logs"));
        let file_appender = tracing_appender::rolling::daily(&log_dir, "amem.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let layer = fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_filter(EnvFilter::new(
                "amem=trace,amem_memory=trace,amem_llm=trace,amem_config=trace,info",
            ));
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::new(filter)),
        )
        .with(file_layer)
        .init();

    guard
}

/// Effective configuration: every section filled in with its defaults.
pub fn effective_config(config: &AmemConfig) -> AmemConfig {
    AmemConfig {
        memory: Some(config.memory()),
        extractor: Some(config.extractor()),
        logging: Some(config.logging()),
    }
}
