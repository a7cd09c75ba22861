//! Cost usage fixture generator CLI
//!
//! A command-line tool for generating synthetic OpenShift usage reports,
//! inspecting generated topologies, and validating generator configs.

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{generate, topology, validate};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Cost usage fixture generator CLI
#[derive(Parser)]
#[command(name = "costgen")]
#[command(author, version, about = "Synthetic OpenShift cost usage report generator", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a topology and write usage reports plus a manifest
    Generate(generate::GenerateArgs),

    /// Print a generated topology without writing reports
    Topology(topology::TopologyArgs),

    /// Load a config and report every problem with it
    Validate(validate::ValidateArgs),
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so report and JSON output on stdout stay clean.
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Generate(args) => generate::run(args)?,
        Commands::Topology(args) => topology::run(args)?,
        Commands::Validate(args) => validate::run(args)?,
    }

    Ok(())
}
