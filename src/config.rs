// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Layers, lowest precedence first: built-in defaults, `pkg-graph.toml`,
//! `PKG_GRAPH_*` environment variables, command-line overrides.

use crate::inventory::{INVENTORY_FILE, RESOLUTIONS_FILE};
use crate::resolution::DuplicatePolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Config file looked up in the working directory
pub const CONFIG_FILE: &str = "pkg-graph.toml";

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "PKG_GRAPH";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Packages whose location starts with this path are workspace members
    pub workspace_root: PathBuf,
    /// Installed-package inventory
    pub inventory_path: PathBuf,
    /// Solved resolution table
    pub resolutions_path: PathBuf,
    /// Handling of conflicting resolution entries
    pub duplicate_resolutions: DuplicatePolicy,
}

impl Config {
    /// Defaults for an invocation from `cwd`
    #[must_use]
    pub fn defaults(cwd: &Path) -> Self {
        Self {
            workspace_root: cwd.to_path_buf(),
            inventory_path: cwd.join(INVENTORY_FILE),
            resolutions_path: cwd.join(RESOLUTIONS_FILE),
            duplicate_resolutions: DuplicatePolicy::default(),
        }
    }

    /// Workspace root as the string used for the locality prefix test
    #[must_use]
    pub fn workspace_prefix(&self) -> String {
        self.workspace_root.to_string_lossy().into_owned()
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Command-line values that take precedence over every other layer
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Explicit config file; must exist when given
    pub config_file: Option<PathBuf>,
    /// Workspace root override
    pub workspace_root: Option<PathBuf>,
    /// Inventory path override
    pub inventory_path: Option<PathBuf>,
    /// Resolution table path override
    pub resolutions_path: Option<PathBuf>,
    /// Switch to first-wins on conflicting resolutions
    pub allow_duplicate_resolutions: bool,
}

/// Load the effective configuration for an invocation from `cwd`
pub fn load(cwd: &Path, overrides: &Overrides) -> Result<Config> {
    let file = overrides
        .config_file
        .clone()
        .unwrap_or_else(|| cwd.join(CONFIG_FILE));

    let settings = ::config::Config::builder()
        .set_default("workspace_root", cwd.to_string_lossy().into_owned())?
        .set_default("inventory_path", INVENTORY_FILE)?
        .set_default("resolutions_path", RESOLUTIONS_FILE)?
        .set_default("duplicate_resolutions", "reject")?
        .add_source(::config::File::from(file.clone()).required(overrides.config_file.is_some()))
        .add_source(::config::Environment::with_prefix(ENV_PREFIX))
        .build()
        .with_context(|| format!("Failed to load configuration from {}", file.display()))?;

    let mut config: Config = settings
        .try_deserialize()
        .context("Invalid configuration")?;

    if let Some(root) = &overrides.workspace_root {
        config.workspace_root.clone_from(root);
    }
    if let Some(path) = &overrides.inventory_path {
        config.inventory_path.clone_from(path);
    }
    if let Some(path) = &overrides.resolutions_path {
        config.resolutions_path.clone_from(path);
    }
    if overrides.allow_duplicate_resolutions {
        config.duplicate_resolutions = DuplicatePolicy::FirstWins;
    }

    config.workspace_root = absolutize(cwd, &config.workspace_root);
    config.inventory_path = absolutize(cwd, &config.inventory_path);
    config.resolutions_path = absolutize(cwd, &config.resolutions_path);

    tracing::debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Join `path` onto `cwd` and fold `.` and `..` lexically.
///
/// The workspace root is matched as a string prefix, so `/work/./` or
/// `/work/sub/..` must collapse to `/work` first.
fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(component),
            },
            other => normalized.push(other),
        }
    }
    normalized
}
