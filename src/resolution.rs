// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Exact-match lookup from a declared `(name, range)` to the version a
//! package manager already picked for it

use crate::error::GraphError;
use crate::types::{PackageName, PackageRange, PackageUniqKey, PackageVersion, ResolutionRecord};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::warn;

/// What to do when the resolution table repeats a key with another version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Fail the load
    #[default]
    Reject,
    /// Keep the earliest entry in table order
    FirstWins,
}

/// Resolution table indexed by its `name@range` key
#[derive(Debug, Clone, Default)]
pub struct ResolutionIndex {
    entries: HashMap<String, PackageVersion>,
}

impl ResolutionIndex {
    /// Index a resolution table.
    ///
    /// Repeated keys that agree on the version are always accepted.
    pub fn from_records(
        records: &[ResolutionRecord],
        policy: DuplicatePolicy,
    ) -> Result<Self, GraphError> {
        let mut entries = HashMap::with_capacity(records.len());

        for record in records {
            match entries.entry(record.key.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(record.version.clone());
                }
                Entry::Occupied(existing) => {
                    if existing.get() == &record.version {
                        continue;
                    }
                    match policy {
                        DuplicatePolicy::Reject => {
                            return Err(GraphError::ConflictingResolution {
                                key: record.key.clone(),
                                first: existing.get().to_string(),
                                second: record.version.to_string(),
                            });
                        }
                        DuplicatePolicy::FirstWins => {
                            warn!(
                                "Ignoring resolution {} -> {} (already resolved to {})",
                                record.key,
                                record.version,
                                existing.get()
                            );
                        }
                    }
                }
            }
        }

        Ok(Self { entries })
    }

    /// Look up the node key a declared range resolved to
    pub fn resolve(
        &self,
        name: &PackageName,
        range: &PackageRange,
    ) -> Result<PackageUniqKey, GraphError> {
        let key = format!("{name}@{range}");
        self.entries
            .get(&key)
            .map(|version| PackageUniqKey::from_parts(name, version))
            .ok_or_else(|| GraphError::ResolutionNotFound {
                name: name.to_string(),
                range: range.to_string(),
            })
    }

    /// Number of distinct keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_exact_key() {
        let index = ResolutionIndex::from_records(
            &[ResolutionRecord::new("c", "^1.0.0", "1.2.0")],
            DuplicatePolicy::Reject,
        )
        .unwrap();

        let key = index.resolve(&"c".into(), &"^1.0.0".into()).unwrap();
        assert_eq!(key.as_str(), "c@1.2.0");
    }

    #[test]
    fn test_resolve_is_not_semver_aware() {
        let index = ResolutionIndex::from_records(
            &[ResolutionRecord::new("c", "^1.0.0", "1.2.0")],
            DuplicatePolicy::Reject,
        )
        .unwrap();

        let err = index.resolve(&"c".into(), &"^1.1.0".into()).unwrap_err();
        assert!(matches!(
            err,
            GraphError::ResolutionNotFound { ref name, ref range }
                if name == "c" && range == "^1.1.0"
        ));
    }

    #[test]
    fn test_scoped_names() {
        let index = ResolutionIndex::from_records(
            &[ResolutionRecord::new("@types/node", "^20", "20.4.1")],
            DuplicatePolicy::Reject,
        )
        .unwrap();

        let key = index.resolve(&"@types/node".into(), &"^20".into()).unwrap();
        assert_eq!(key.as_str(), "@types/node@20.4.1");
    }

    #[test]
    fn test_identical_duplicates_accepted() {
        let records = vec![
            ResolutionRecord::new("a", "*", "1.0.0"),
            ResolutionRecord::new("a", "*", "1.0.0"),
        ];
        let index = ResolutionIndex::from_records(&records, DuplicatePolicy::Reject).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_conflicting_duplicates_rejected() {
        let records = vec![
            ResolutionRecord::new("a", "*", "1.0.0"),
            ResolutionRecord::new("a", "*", "2.0.0"),
        ];
        let err = ResolutionIndex::from_records(&records, DuplicatePolicy::Reject).unwrap_err();
        assert_eq!(
            err.to_string(),
            "conflicting resolutions for 'a@*': '1.0.0' and '2.0.0'"
        );
    }

    #[test]
    fn test_conflicting_duplicates_first_wins() {
        let records = vec![
            ResolutionRecord::new("a", "*", "1.0.0"),
            ResolutionRecord::new("a", "*", "2.0.0"),
        ];
        let index = ResolutionIndex::from_records(&records, DuplicatePolicy::FirstWins).unwrap();
        let key = index.resolve(&"a".into(), &"*".into()).unwrap();
        assert_eq!(key.as_str(), "a@1.0.0");
    }
}
