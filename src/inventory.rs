// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Loading the package inventory and the resolution table

use crate::error::GraphError;
use crate::types::{PackageRecord, ResolutionRecord};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Default inventory file name, relative to the invocation directory
pub const INVENTORY_FILE: &str = "map.json";

/// Default resolution table file name, relative to the invocation directory
pub const RESOLUTIONS_FILE: &str = "resolutions.json";

/// Load the installed-package inventory (a JSON array of records)
pub fn load_inventory(path: &Path) -> Result<Vec<PackageRecord>, GraphError> {
    let records: Vec<PackageRecord> = read_table(path)?;
    debug!("Loaded {} packages from {}", records.len(), path.display());
    Ok(records)
}

/// Load the resolution table (a JSON array of `{ key, version }`)
pub fn load_resolutions(path: &Path) -> Result<Vec<ResolutionRecord>, GraphError> {
    let records: Vec<ResolutionRecord> = read_table(path)?;
    debug!("Loaded {} resolutions from {}", records.len(), path.display());
    Ok(records)
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, GraphError> {
    let content = fs::read_to_string(path).map_err(|source| GraphError::InputUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| GraphError::InputMalformed {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_inventory_preserves_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(INVENTORY_FILE);
        fs::write(
            &path,
            r#"[
                { "name": "b", "version": "2.0.0", "location": "/cache/b" },
                { "name": "a", "version": "1.0.0", "location": "/work/a" }
            ]"#,
        )
        .unwrap();

        let records = load_inventory(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], PackageRecord::new("b", "2.0.0", "/cache/b"));
        assert_eq!(records[1].uniq_key().as_str(), "a@1.0.0");
    }

    #[test]
    fn test_load_resolutions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(RESOLUTIONS_FILE);
        fs::write(&path, r#"[{ "key": "c@^1.0.0", "version": "1.2.0" }]"#).unwrap();

        let records = load_resolutions(&path).unwrap();
        assert_eq!(records, vec![ResolutionRecord::new("c", "^1.0.0", "1.2.0")]);
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(INVENTORY_FILE);
        fs::write(&path, r#"[{ "name": "a", "version": "1.0.0" }]"#).unwrap();

        let err = load_inventory(&path).unwrap_err();
        assert!(matches!(err, GraphError::InputMalformed { .. }));
    }

    #[test]
    fn test_object_instead_of_array_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(RESOLUTIONS_FILE);
        fs::write(&path, r#"{ "c@^1.0.0": "1.2.0" }"#).unwrap();

        assert!(matches!(
            load_resolutions(&path),
            Err(GraphError::InputMalformed { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let err = load_inventory(&dir.path().join(INVENTORY_FILE)).unwrap_err();
        assert!(matches!(err, GraphError::InputUnreadable { .. }));
    }
}
