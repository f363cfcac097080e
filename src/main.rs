// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! pkg-graph CLI - dependency graph from an installed-package inventory

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use pkg_graph::commands;
use pkg_graph::commands::build::OutputFormat;
use pkg_graph::config::{self, Overrides};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pkg-graph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "PKG_GRAPH_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Workspace root; packages located under it are local
    #[arg(long, global = true)]
    workspace_root: Option<PathBuf>,

    /// Package inventory file
    #[arg(long, global = true)]
    inventory: Option<PathBuf>,

    /// Resolution table file
    #[arg(long, global = true)]
    resolutions: Option<PathBuf>,

    /// Keep the first entry when the resolution table repeats a key
    #[arg(long, global = true)]
    allow_duplicate_resolutions: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dependency graph (default)
    Build {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config,

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for the graph
    let log_level = match cli.verbose {
        0 if cli.quiet => tracing::Level::ERROR,
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(log_level).into())
                .from_env_lossy(),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let command = cli.command.unwrap_or(Commands::Build {
        format: OutputFormat::Json,
        output: None,
    });

    let overrides = Overrides {
        config_file: cli.config,
        workspace_root: cli.workspace_root,
        inventory_path: cli.inventory,
        resolutions_path: cli.resolutions,
        allow_duplicate_resolutions: cli.allow_duplicate_resolutions,
    };

    match command {
        Commands::Build { format, output } => {
            commands::build::run(&load_config(&overrides)?, format, output)
        }
        Commands::Config => commands::config::run(&load_config(&overrides)?),
        Commands::Completions { shell } => commands::completions::run(shell, &mut Cli::command()),
    }
}

fn load_config(overrides: &Overrides) -> Result<config::Config> {
    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    config::load(&cwd, overrides)
}
