//! dealhook - webhook relay and price tracker waitlist proxy
//!
//! Main entry point for the dealhook CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{config, start};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// dealhook - webhook relay and price tracker waitlist proxy
#[derive(Parser)]
#[command(name = "dealhook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the dealhook server
    Start(start::StartArgs),

    /// Configuration inspection
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable) + daily rolling JSON file
    let filter = if cli.verbose {
        "dealhook=debug,dealhook_server=debug,dealhook_oauth=debug,dealhook_upstream=debug,dealhook_store=debug,dealhook_config=debug,tower_http=debug,info"
    } else {
        "dealhook=info,dealhook_server=info,dealhook_oauth=info,dealhook_upstream=info,dealhook_store=info,warn"
    };

    let log_dir = dealhook_config::xdg_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "dealhook.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "dealhook=trace,dealhook_server=trace,dealhook_oauth=trace,dealhook_upstream=trace,dealhook_store=trace,dealhook_config=trace,info",
                )),
        )
        .init();

    let ctx = commands::Context {
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Start(args) => start::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
