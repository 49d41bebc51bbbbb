//! Config command - inspect resolved configuration.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use dealhook_config::DealhookConfig;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Path to config file (overrides default discovery)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration (files + environment)
    Show,

    /// Show the user config file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(args.config, ctx),
        ConfigCommand::Path => cmd_path(),
    }
}

fn cmd_show(explicit: Option<PathBuf>, ctx: &Context) -> Result<()> {
    let loaded = super::load_resolved_config(explicit.as_deref())?;

    println!("# dealhook configuration\n");

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for source in sources {
            println!("  {}", source.display());
        }
        println!();
    }

    if ctx.verbose {
        println!("Search order (later overrides earlier):");
        for source in &loaded.sources {
            let status = if source.loaded { "✓" } else { "·" };
            println!("  {} {}", status, source.path.display());
        }
        println!();
    }

    let server = loaded.config.server();
    println!("Server:");
    println!("  bind: {}:{}", server.bind, server.port);
    println!(
        "  database: {}",
        loaded
            .config
            .store()
            .resolve_database(&super::data_dir())
            .display()
    );
    println!();

    if !loaded.warnings.is_empty() {
        println!("Warnings:");
        for w in &loaded.warnings {
            println!("  ⚠ {}", w);
        }
        println!();
    }

    println!("---\nResolved config:\n");
    println!("{}", redacted(loaded.config).to_toml()?);

    Ok(())
}

fn cmd_path() -> Result<()> {
    if let Some(path) = dealhook_config::xdg_config_path() {
        println!("{}", path.display());
    } else {
        eprintln!("Could not determine config directory");
    }
    Ok(())
}

/// Mask API keys before printing.
fn redacted(mut config: DealhookConfig) -> DealhookConfig {
    if let Some(upstream) = config.upstream.as_mut() {
        for key in [&mut upstream.itad_api_key, &mut upstream.steam_api_key] {
            if key.is_some() {
                *key = Some("********".to_string());
            }
        }
    }
    config
}
