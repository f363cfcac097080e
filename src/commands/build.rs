// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Build command - replays the resolution table and writes the graph

use crate::config::Config;
use crate::graph::GraphBuilder;
use crate::inventory::{load_inventory, load_resolutions};
use crate::manifest::FsManifestStore;
use crate::resolution::ResolutionIndex;
use crate::types::Graph;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

/// Supported output formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON `{ nodes, links }`
    #[default]
    Json,
    /// Graphviz DOT
    Dot,
}

impl OutputFormat {
    /// Get file extension for format
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Dot => "dot",
        }
    }
}

/// Load both input tables and build the graph.
///
/// Relative package locations are resolved against the workspace root.
pub fn build(config: &Config) -> Result<Graph> {
    let inventory = load_inventory(&config.inventory_path)
        .context("Failed to load package inventory")?;
    let resolutions = load_resolutions(&config.resolutions_path)
        .context("Failed to load resolution table")?;

    let index = ResolutionIndex::from_records(&resolutions, config.duplicate_resolutions)
        .context("Failed to index resolution table")?;
    let store = FsManifestStore::new(&config.workspace_root);

    let graph = GraphBuilder::new(&index, &store, config.workspace_prefix())
        .build(&inventory)
        .context("Failed to build dependency graph")?;

    debug!(
        "{} peer targets are not part of the node set",
        graph.dangling_peer_targets().len()
    );

    Ok(graph)
}

/// Run the build command
pub fn run(config: &Config, format: OutputFormat, output: Option<PathBuf>) -> Result<()> {
    info!("Building graph from {}", config.inventory_path.display());

    let graph = build(config)?;

    let mut content = match format {
        OutputFormat::Json => graph.to_json().context("Failed to serialize graph to JSON")?,
        OutputFormat::Dot => graph.to_dot(),
    };
    if !content.ends_with('\n') {
        content.push('\n');
    }

    match output {
        Some(path) => {
            fs::write(&path, &content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            info!("Wrote {} graph to {}", format.extension(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}
