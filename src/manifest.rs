// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Package manifests and where they come from
//!
//! The graph builder never touches the filesystem directly: it asks a
//! [`ManifestStore`] for the descriptor at a package location. The
//! filesystem store is used by the CLI; the in-memory store backs tests.

use crate::error::GraphError;
use crate::types::{Locality, PackageLocation, PackageName, PackageRange};
use indexmap::{IndexMap, IndexSet};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Manifest file name looked up when a location is a directory
pub const MANIFEST_FILE: &str = "package.json";

/// The dependency-related subset of a `package.json`
///
/// Parsing is lenient: a dependency field that is not an object counts as
/// absent, numeric ranges become strings and other range values are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Manifest {
    /// Runtime dependencies
    #[serde(deserialize_with = "string_map")]
    pub dependencies: IndexMap<String, String>,
    /// Build/test dependencies, only honoured for local packages
    #[serde(deserialize_with = "string_map")]
    pub dev_dependencies: IndexMap<String, String>,
    /// Peer requirements; every key counts whatever its value
    #[serde(deserialize_with = "peer_map")]
    pub peer_dependencies: IndexMap<String, String>,
    /// Peer metadata; its keys count as peer requirements too
    #[serde(deserialize_with = "value_map")]
    pub peer_dependencies_meta: IndexMap<String, Value>,
}

/// A JSON object in document order, or anything else
#[derive(Deserialize)]
#[serde(untagged)]
enum ObjectOrOther {
    Object(IndexMap<String, Value>),
    Other(IgnoredAny),
}

fn value_map<'de, D>(deserializer: D) -> Result<IndexMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match ObjectOrOther::deserialize(deserializer)? {
        ObjectOrOther::Object(map) => map,
        ObjectOrOther::Other(_) => IndexMap::new(),
    })
}

fn string_map<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_map(deserializer)?
        .into_iter()
        .filter_map(|(name, range)| map_string(range).map(|range| (name, range)))
        .collect())
}

fn peer_map<'de, D>(deserializer: D) -> Result<IndexMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_map(deserializer)?
        .into_iter()
        .map(|(name, range)| match range {
            Value::String(range) => (name, range),
            other => (name, other.to_string()),
        })
        .collect())
}

fn map_string(value: Value) -> Option<String> {
    match value {
        Value::String(v) => Some(v),
        Value::Number(v) => Some(v.to_string()),
        _ => None,
    }
}

impl Manifest {
    /// Parse a manifest from JSON text
    pub fn from_json_str(source: &str) -> serde_json::Result<Self> {
        serde_json::from_str(source)
    }

    /// Dependencies that produce regular links, in declaration order.
    ///
    /// Local packages also contribute `devDependencies`; a name present in
    /// both keeps its `dependencies` position and takes the dev range.
    #[must_use]
    pub fn declared_dependencies(
        &self,
        locality: Locality,
    ) -> IndexMap<PackageName, PackageRange> {
        let mut deps: IndexMap<PackageName, PackageRange> = self
            .dependencies
            .iter()
            .map(|(name, range)| {
                (PackageName::new(name.as_str()), PackageRange::new(range.as_str()))
            })
            .collect();

        if locality.is_local() {
            for (name, range) in &self.dev_dependencies {
                deps.insert(PackageName::new(name.as_str()), PackageRange::new(range.as_str()));
            }
        }

        deps
    }

    /// Names that produce peer links, in declaration order.
    ///
    /// Local packages satisfy their own peers and always yield nothing.
    #[must_use]
    pub fn declared_peer_names(&self, locality: Locality) -> IndexSet<PackageName> {
        if locality.is_local() {
            return IndexSet::new();
        }

        self.peer_dependencies
            .keys()
            .chain(self.peer_dependencies_meta.keys())
            .map(|name| PackageName::new(name.as_str()))
            .collect()
    }
}

/// Source of package manifests
pub trait ManifestStore {
    /// Load the manifest of the package at `location`
    fn load(&self, location: &PackageLocation) -> Result<Manifest, GraphError>;
}

/// Reads `package.json` files from disk
#[derive(Debug, Clone)]
pub struct FsManifestStore {
    base_dir: PathBuf,
}

impl FsManifestStore {
    /// Create a store resolving relative locations against `base_dir`
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Path of the manifest file for a location.
    ///
    /// A directory location points at its `package.json`; anything else is
    /// taken to be the manifest file itself.
    #[must_use]
    pub fn manifest_path(&self, location: &PackageLocation) -> PathBuf {
        let path = self.base_dir.join(Path::new(location.as_str()));
        if path.is_dir() {
            path.join(MANIFEST_FILE)
        } else {
            path
        }
    }
}

impl ManifestStore for FsManifestStore {
    fn load(&self, location: &PackageLocation) -> Result<Manifest, GraphError> {
        let path = self.manifest_path(location);
        let content = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                GraphError::ManifestNotFound {
                    location: location.to_string(),
                }
            } else {
                GraphError::ManifestUnreadable {
                    location: path.display().to_string(),
                    source,
                }
            }
        })?;

        Manifest::from_json_str(&content).map_err(|source| GraphError::ManifestMalformed {
            location: path.display().to_string(),
            source,
        })
    }
}

/// Manifests held in memory, keyed by location
#[derive(Debug, Clone, Default)]
pub struct MemoryManifestStore {
    manifests: HashMap<PackageLocation, Manifest>,
}

impl MemoryManifestStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a manifest for a location, replacing any previous one
    pub fn insert(&mut self, location: impl Into<PackageLocation>, manifest: Manifest) {
        self.manifests.insert(location.into(), manifest);
    }

    /// Builder-style [`insert`](Self::insert)
    #[must_use]
    pub fn with(mut self, location: impl Into<PackageLocation>, manifest: Manifest) -> Self {
        self.insert(location, manifest);
        self
    }
}

impl ManifestStore for MemoryManifestStore {
    fn load(&self, location: &PackageLocation) -> Result<Manifest, GraphError> {
        self.manifests
            .get(location)
            .cloned()
            .ok_or_else(|| GraphError::ManifestNotFound {
                location: location.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names<'a>(iter: impl IntoIterator<Item = &'a PackageName>) -> Vec<&'a str> {
        iter.into_iter().map(PackageName::as_str).collect()
    }

    #[test]
    fn test_parse_ignores_unrelated_fields() {
        let manifest = Manifest::from_json_str(
            r#"{
                "name": "b",
                "version": "2.0.0",
                "main": "index.js",
                "dependencies": { "c": "^1.0.0" }
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.dependencies.get("c").map(String::as_str), Some("^1.0.0"));
        assert!(manifest.dev_dependencies.is_empty());
    }

    #[test]
    fn test_external_skips_dev_dependencies() {
        let manifest = Manifest::from_json_str(
            r#"{ "dependencies": { "c": "^1.0.0" }, "devDependencies": { "jest": "^29" } }"#,
        )
        .unwrap();

        let deps = manifest.declared_dependencies(Locality::External);
        assert_eq!(names(deps.keys()), vec!["c"]);
    }

    #[test]
    fn test_local_merges_dev_dependencies() {
        let manifest = Manifest::from_json_str(
            r#"{
                "dependencies": { "c": "^1.0.0", "e": "^3.0.0" },
                "devDependencies": { "jest": "^29", "c": "^1.5.0" }
            }"#,
        )
        .unwrap();

        let deps = manifest.declared_dependencies(Locality::Local);
        assert_eq!(names(deps.keys()), vec!["c", "e", "jest"]);
        assert_eq!(deps[&PackageName::new("c")].as_str(), "^1.5.0");
    }

    #[test]
    fn test_peer_names_union_meta() {
        let manifest = Manifest::from_json_str(
            r#"{
                "peerDependencies": { "react": "*", "react-dom": "*" },
                "peerDependenciesMeta": {
                    "react-dom": { "optional": true },
                    "typescript": { "optional": true }
                }
            }"#,
        )
        .unwrap();

        let peers = manifest.declared_peer_names(Locality::External);
        assert_eq!(names(&peers), vec!["react", "react-dom", "typescript"]);
    }

    #[test]
    fn test_null_dependency_fields_count_as_absent() {
        let manifest = Manifest::from_json_str(
            r#"{
                "dependencies": null,
                "devDependencies": [],
                "peerDependencies": "react",
                "peerDependenciesMeta": null
            }"#,
        )
        .unwrap();

        assert_eq!(manifest, Manifest::default());
        assert!(manifest.declared_dependencies(Locality::Local).is_empty());
        assert!(manifest.declared_peer_names(Locality::External).is_empty());
    }

    #[test]
    fn test_numeric_ranges_become_strings() {
        let manifest = Manifest::from_json_str(
            r#"{ "dependencies": { "c": 1, "d": "^2.0.0", "e": { "version": "3" }, "f": null } }"#,
        )
        .unwrap();

        let deps = manifest.declared_dependencies(Locality::External);
        assert_eq!(names(deps.keys()), vec!["c", "d"]);
        assert_eq!(deps[&PackageName::new("c")].as_str(), "1");
    }

    #[test]
    fn test_peer_keys_kept_whatever_their_value() {
        let manifest = Manifest::from_json_str(
            r#"{
                "peerDependencies": { "zod": true, "react": "*", "vue": null },
                "peerDependenciesMeta": { "svelte": true }
            }"#,
        )
        .unwrap();

        let peers = manifest.declared_peer_names(Locality::External);
        assert_eq!(names(&peers), vec!["zod", "react", "vue", "svelte"]);
    }

    #[test]
    fn test_local_has_no_peers() {
        let manifest =
            Manifest::from_json_str(r#"{ "peerDependencies": { "react": "*" } }"#).unwrap();

        assert!(manifest.declared_peer_names(Locality::Local).is_empty());
    }

    #[test]
    fn test_fs_store_reads_directory_manifest() {
        let dir = TempDir::new().unwrap();
        let pkg = dir.path().join("pkg");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join(MANIFEST_FILE), r#"{ "dependencies": { "x": "1" } }"#).unwrap();

        let store = FsManifestStore::new(dir.path());
        let manifest = store.load(&PackageLocation::new("pkg")).unwrap();
        assert_eq!(manifest.dependencies.len(), 1);
    }

    #[test]
    fn test_fs_store_reads_manifest_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("descriptor.json");
        fs::write(&file, r#"{ "peerDependencies": { "y": "*" } }"#).unwrap();

        let store = FsManifestStore::new(dir.path());
        let location = PackageLocation::new(file.to_string_lossy().as_ref());
        let manifest = store.load(&location).unwrap();
        assert_eq!(manifest.peer_dependencies.len(), 1);
    }

    #[test]
    fn test_fs_store_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let store = FsManifestStore::new(dir.path());

        let err = store.load(&PackageLocation::new("nowhere")).unwrap_err();
        assert!(matches!(err, GraphError::ManifestNotFound { .. }));
    }

    #[test]
    fn test_fs_store_malformed_manifest() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.json"), "{ not json").unwrap();

        let store = FsManifestStore::new(dir.path());
        let err = store.load(&PackageLocation::new("bad.json")).unwrap_err();
        assert!(matches!(err, GraphError::ManifestMalformed { .. }));
    }

    #[test]
    fn test_memory_store_missing() {
        let store = MemoryManifestStore::new();
        assert!(store.load(&PackageLocation::new("/x")).is_err());
    }
}
