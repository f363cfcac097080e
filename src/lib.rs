// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! pkg-graph library - replay a solved resolution table into a dependency graph
//!
//! The crate takes a flat inventory of installed packages together with the
//! range-to-version table a package manager already solved, reads each
//! package's manifest, and reconstructs the directed graph of regular and peer
//! dependencies. No semver resolution happens here.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod config;
pub mod error;
pub mod graph;
pub mod inventory;
pub mod manifest;
pub mod resolution;

/// Core data types: package identities, graph nodes and links
pub mod types {
    use serde::{Deserialize, Serialize};
    use std::fmt;

    // =========================================================================
    // Package Identity Parts
    // =========================================================================

    macro_rules! string_newtype {
        ($(#[$meta:meta])* $name:ident) => {
            $(#[$meta])*
            #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(String);

            impl $name {
                /// Wrap a raw string
                #[must_use]
                pub fn new(value: impl Into<String>) -> Self {
                    Self(value.into())
                }

                /// Borrow the underlying string
                #[must_use]
                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<&str> for $name {
                fn from(value: &str) -> Self {
                    Self(value.to_owned())
                }
            }

            impl From<String> for $name {
                fn from(value: String) -> Self {
                    Self(value)
                }
            }
        };
    }

    string_newtype!(
        /// Bare package name, e.g. `react` or `@types/node`
        PackageName
    );
    string_newtype!(
        /// Concrete installed version, e.g. `1.2.0`
        PackageVersion
    );
    string_newtype!(
        /// Declared version range, e.g. `^1.0.0` or `workspace:*`
        PackageRange
    );
    string_newtype!(
        /// On-disk location of an installed package
        PackageLocation
    );
    string_newtype!(
        /// Node identity `name@version`
        PackageUniqKey
    );

    impl PackageUniqKey {
        /// Derive the node key for a (name, version) pair
        #[must_use]
        pub fn from_parts(name: &PackageName, version: &PackageVersion) -> Self {
            Self(format!("{name}@{version}"))
        }
    }

    // =========================================================================
    // Input Records
    // =========================================================================

    /// One installed package instance from the inventory (`map.json`)
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PackageRecord {
        /// Package name
        pub name: PackageName,
        /// Installed version
        pub version: PackageVersion,
        /// Where the package lives on disk
        pub location: PackageLocation,
    }

    impl PackageRecord {
        /// Build a record from string parts
        #[must_use]
        pub fn new(name: &str, version: &str, location: &str) -> Self {
            Self {
                name: name.into(),
                version: version.into(),
                location: location.into(),
            }
        }

        /// Node key of this record
        #[must_use]
        pub fn uniq_key(&self) -> PackageUniqKey {
            PackageUniqKey::from_parts(&self.name, &self.version)
        }
    }

    /// One memoized resolution decision from `resolutions.json`
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ResolutionRecord {
        /// Lookup key in the form `name@range`
        pub key: String,
        /// Version the resolver picked for that range
        pub version: PackageVersion,
    }

    impl ResolutionRecord {
        /// Build a record for `name@range`
        #[must_use]
        pub fn new(name: &str, range: &str, version: &str) -> Self {
            Self {
                key: format!("{name}@{range}"),
                version: version.into(),
            }
        }
    }

    // =========================================================================
    // Locality
    // =========================================================================

    /// Whether a package is a workspace member or an installed dependency
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Locality {
        /// Location lies under the workspace root
        Local,
        /// Anything else (registry installs, caches)
        External,
    }

    impl Locality {
        /// Classify a location against the workspace root.
        ///
        /// This is a plain string prefix test on the location.
        #[must_use]
        pub fn of(location: &PackageLocation, workspace_root: &str) -> Self {
            if location.as_str().starts_with(workspace_root) {
                Self::Local
            } else {
                Self::External
            }
        }

        /// True for workspace members
        #[must_use]
        pub fn is_local(self) -> bool {
            self == Self::Local
        }
    }

    // =========================================================================
    // Graph
    // =========================================================================

    /// A graph node: the synthetic workspace root or an installed package
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(into = "String", from = "String")]
    pub enum NodeId {
        /// Synthetic parent of every local package
        Root,
        /// A `name@version` package node
        Package(PackageUniqKey),
    }

    impl NodeId {
        /// Literal id of the root node
        pub const ROOT: &'static str = "root";

        /// String form used in the output document
        #[must_use]
        pub fn as_str(&self) -> &str {
            match self {
                Self::Root => Self::ROOT,
                Self::Package(key) => key.as_str(),
            }
        }
    }

    impl fmt::Display for NodeId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    impl From<PackageUniqKey> for NodeId {
        fn from(key: PackageUniqKey) -> Self {
            Self::Package(key)
        }
    }

    impl From<NodeId> for String {
        fn from(id: NodeId) -> Self {
            match id {
                NodeId::Root => NodeId::ROOT.to_owned(),
                NodeId::Package(key) => key.0,
            }
        }
    }

    impl From<String> for NodeId {
        fn from(value: String) -> Self {
            if value == Self::ROOT {
                Self::Root
            } else {
                Self::Package(PackageUniqKey(value))
            }
        }
    }

    /// Edge kind as written in the `type` field
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum LinkKind {
        /// Dependency resolved to a concrete node
        Regular,
        /// Unversioned peer requirement on a package name
        Peer,
    }

    impl fmt::Display for LinkKind {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Regular => f.write_str("regular"),
                Self::Peer => f.write_str("peer"),
            }
        }
    }

    /// Directed link between two graph entries.
    ///
    /// A peer link targets a *name reference*, not a node: the consumer's own
    /// graph is expected to provide some version of that package, so the
    /// target is usually absent from [`Graph::nodes`].
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(into = "RawLink", from = "RawLink")]
    pub enum GraphLink {
        /// `source` depends on the resolved node `target`
        Regular {
            /// Depending node
            source: NodeId,
            /// Resolved dependency node
            target: NodeId,
        },
        /// `source` requires some version of `target` from its consumer
        Peer {
            /// Declaring node
            source: NodeId,
            /// Bare package name
            target: PackageName,
        },
    }

    impl GraphLink {
        /// Which kind of link this is
        #[must_use]
        pub fn kind(&self) -> LinkKind {
            match self {
                Self::Regular { .. } => LinkKind::Regular,
                Self::Peer { .. } => LinkKind::Peer,
            }
        }

        /// Source node
        #[must_use]
        pub fn source(&self) -> &NodeId {
            match self {
                Self::Regular { source, .. } | Self::Peer { source, .. } => source,
            }
        }

        /// Target as written in the output document
        #[must_use]
        pub fn target_str(&self) -> &str {
            match self {
                Self::Regular { target, .. } => target.as_str(),
                Self::Peer { target, .. } => target.as_str(),
            }
        }
    }

    /// Wire shape of a link: `{ "source", "target", "type" }`
    #[derive(Clone, Serialize, Deserialize)]
    struct RawLink {
        source: String,
        target: String,
        #[serde(rename = "type")]
        kind: LinkKind,
    }

    impl From<GraphLink> for RawLink {
        fn from(link: GraphLink) -> Self {
            match link {
                GraphLink::Regular { source, target } => Self {
                    source: source.into(),
                    target: target.into(),
                    kind: LinkKind::Regular,
                },
                GraphLink::Peer { source, target } => Self {
                    source: source.into(),
                    target: target.0,
                    kind: LinkKind::Peer,
                },
            }
        }
    }

    impl From<RawLink> for GraphLink {
        fn from(raw: RawLink) -> Self {
            match raw.kind {
                LinkKind::Regular => Self::Regular {
                    source: raw.source.into(),
                    target: raw.target.into(),
                },
                LinkKind::Peer => Self::Peer {
                    source: raw.source.into(),
                    target: PackageName(raw.target),
                },
            }
        }
    }

    /// The assembled dependency graph
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Graph {
        /// One id per inventory entry in inventory order, then `root`
        pub nodes: Vec<NodeId>,
        /// Per-package links in inventory order, then root links
        pub links: Vec<GraphLink>,
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::error::GraphError;
    pub use crate::graph::{build_graph, GraphBuilder};
    pub use crate::manifest::{FsManifestStore, Manifest, ManifestStore, MemoryManifestStore};
    pub use crate::resolution::{DuplicatePolicy, ResolutionIndex};
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
