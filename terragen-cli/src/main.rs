//! Terragen CLI - infrastructure generation and validation tools

#![warn(missing_docs)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

use commands::{generate, validate};

#[derive(Parser)]
#[command(name = "terragen")]
#[command(about = "Declarative infrastructure generator", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full infrastructure and export the resource document
    Generate {
        /// Directory the exported files are written to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the merged document instead of the build summary
        #[arg(long)]
        print_document: bool,
    },

    /// Validate module wiring without exporting anything
    Validate,

    /// Print the dependency diagnostic snapshot as JSON
    Graph,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = config::load_config(cli.config)?;

    match cli.command {
        Commands::Generate {
            output,
            print_document,
        } => generate::generate(&config, output, print_document),

        Commands::Validate => validate::validate(&config),

        Commands::Graph => validate::graph(&config),
    }
}
