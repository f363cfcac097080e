// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Failure taxonomy for graph construction
//!
//! Every variant is fatal: the build stops at the first error and no partial
//! graph is produced.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading inputs or building the graph
#[derive(Debug, Error)]
pub enum GraphError {
    /// A declared range has no entry in the resolution table
    #[error("no resolution recorded for '{name}@{range}'")]
    ResolutionNotFound {
        /// Dependency name
        name: String,
        /// Declared range
        range: String,
    },

    /// Two resolution entries share a key but disagree on the version
    #[error("conflicting resolutions for '{key}': '{first}' and '{second}'")]
    ConflictingResolution {
        /// Shared `name@range` key
        key: String,
        /// Version of the earlier entry
        first: String,
        /// Version of the later entry
        second: String,
    },

    /// No manifest exists for a package location
    #[error("no manifest found for package at {location}")]
    ManifestNotFound {
        /// Package location
        location: String,
    },

    /// The manifest file exists but could not be read
    #[error("failed to read manifest {location}")]
    ManifestUnreadable {
        /// Manifest path
        location: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not a valid package descriptor
    #[error("failed to parse manifest {location}")]
    ManifestMalformed {
        /// Manifest path
        location: String,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// An input table could not be read
    #[error("failed to read {}", path.display())]
    InputUnreadable {
        /// Input file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// An input table is structurally invalid
    #[error("failed to parse {}", path.display())]
    InputMalformed {
        /// Input file
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },
}
