//! Records shared by the registry, the reconciler, and the index projection.
//!
//! Every derived record is built by a pure constructor from its source record.
//! Equality is full-field value equality; the reconciler relies on it to
//! decide what is dirty.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ── Release registry ───────────────────────────────────────────────

/// One upstream naming build for a game version file id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEntry {
    pub version_file_id: String,
    pub separator: String,
    pub build: u32,
    /// Maven version string of the artifact, e.g. `1.20.1+build.10`.
    pub artifact_name: String,
}

/// Persisted registry document: latest accepted build per version file id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseRegistry {
    pub timestamp: DateTime<Utc>,
    /// Iterates in `order` order after any change.
    pub entries: IndexMap<String, ReleaseEntry>,
    /// First-seen order of version file ids. Append-only.
    pub order: Vec<String>,
}

impl ReleaseRegistry {
    /// Merge freshly fetched entries into the registry.
    ///
    /// Unknown ids are appended to `order`. A stored entry is replaced only
    /// when the incoming one differs and carries a strictly greater build.
    /// Returns whether anything changed.
    pub fn merge_entries(&mut self, fetched: impl IntoIterator<Item = ReleaseEntry>) -> bool {
        let mut dirty = false;

        for entry in fetched {
            if !self.order.contains(&entry.version_file_id) {
                self.order.push(entry.version_file_id.clone());
                dirty = true;
            }

            let replace = match self.entries.get(&entry.version_file_id) {
                None => true,
                Some(stored) => *stored != entry && entry.build > stored.build,
            };
            if replace {
                self.entries.insert(entry.version_file_id.clone(), entry);
                dirty = true;
            }
        }

        if dirty {
            let positions: HashMap<&str, usize> = self
                .order
                .iter()
                .enumerate()
                .map(|(i, id)| (id.as_str(), i))
                .collect();
            self.entries.sort_by(|a, _, b, _| {
                let pa = positions.get(a.as_str()).copied().unwrap_or(usize::MAX);
                let pb = positions.get(b.as_str()).copied().unwrap_or(usize::MAX);
                pa.cmp(&pb)
            });
        }

        dirty
    }

    /// Discovery-order position of every known version file id.
    pub fn positions(&self) -> HashMap<&str, usize> {
        self.order
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect()
    }
}

// ── Description dataset ────────────────────────────────────────────

/// One artifact's naming-description entry from the external dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionEntry {
    pub version_id: String,
    pub version_file_id: String,
    pub version_release_time: DateTime<Utc>,
    pub jar_key: String,
    #[serde(rename = "jar_sha1_meta")]
    pub content_hash: String,
}

// ── Combined document ──────────────────────────────────────────────

/// Naming artifact snapshot for one game version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedYarn {
    pub version_id: String,
    pub version_file_id: String,
    pub version_release_time: DateTime<Utc>,
    pub separator: String,
    pub build: u32,
    pub artifact_name: String,
}

impl CombinedYarn {
    pub fn from_release(
        entry: &ReleaseEntry,
        version_id: &str,
        version_release_time: DateTime<Utc>,
    ) -> Self {
        Self {
            version_id: version_id.to_string(),
            version_file_id: entry.version_file_id.clone(),
            version_release_time,
            separator: entry.separator.clone(),
            build: entry.build,
            artifact_name: entry.artifact_name.clone(),
        }
    }
}

/// Description entry snapshot for one jar of one game version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedJar {
    pub version_id: String,
    pub version_file_id: String,
    pub version_release_time: DateTime<Utc>,
    pub jar_key: String,
    #[serde(rename = "jar_sha1_meta")]
    pub content_hash: String,
}

impl CombinedJar {
    pub fn from_description(entry: &DescriptionEntry) -> Self {
        Self {
            version_id: entry.version_id.clone(),
            version_file_id: entry.version_file_id.clone(),
            version_release_time: entry.version_release_time,
            jar_key: entry.jar_key.clone(),
            content_hash: entry.content_hash.clone(),
        }
    }
}

/// Everything tracked for one game version. Created once, mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedVersion {
    pub version_id: String,
    pub version_file_id: String,
    pub version_release_time: DateTime<Utc>,
    pub yarn: CombinedYarn,
    pub jars: IndexMap<String, CombinedJar>,
}

/// Persisted combined document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedRoot {
    pub timestamp: DateTime<Utc>,
    /// Registry timestamp observed by the last reconciliation.
    pub fabric_timestamp: DateTime<Utc>,
    /// Description dataset timestamp observed by the last reconciliation.
    pub jar_descs_timestamp: DateTime<Utc>,
    pub combined: IndexMap<String, CombinedVersion>,
}

// ── Index document ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexJar {
    pub version_id: String,
    pub version_file_id: String,
    pub version_release_time: DateTime<Utc>,
    pub yarn_build: u32,
    pub jar_key: String,
    /// Merged mapping path relative to the published root.
    pub path: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexVersion {
    pub version_id: String,
    pub version_file_id: String,
    pub version_release_time: DateTime<Utc>,
    pub yarn_build: u32,
    pub jars: IndexMap<String, IndexJar>,
}

/// Public projection of [`CombinedRoot`]. Never patched, only rebuilt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexRoot {
    pub timestamp: DateTime<Utc>,
    pub versions: IndexMap<String, IndexVersion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, build: u32) -> ReleaseEntry {
        ReleaseEntry {
            version_file_id: id.to_string(),
            separator: "+build.".to_string(),
            build,
            artifact_name: format!("{id}+build.{build}"),
        }
    }

    #[test]
    fn test_merge_appends_order_on_first_sight() {
        let mut registry = ReleaseRegistry::default();
        assert!(registry.merge_entries([entry("1.20.2", 1), entry("1.20.1", 3)]));
        assert_eq!(registry.order, vec!["1.20.2", "1.20.1"]);
        assert_eq!(registry.entries.len(), 2);
    }

    #[test]
    fn test_merge_rejects_lower_build() {
        let mut registry = ReleaseRegistry::default();
        registry.merge_entries([entry("1.20.1", 5)]);

        assert!(!registry.merge_entries([entry("1.20.1", 4)]));
        assert_eq!(registry.entries["1.20.1"].build, 5);
    }

    #[test]
    fn test_merge_rejects_same_build_with_other_content() {
        let mut registry = ReleaseRegistry::default();
        registry.merge_entries([entry("1.20.1", 5)]);

        let mut changed = entry("1.20.1", 5);
        changed.artifact_name = "other".to_string();
        assert!(!registry.merge_entries([changed]));
        assert_eq!(registry.entries["1.20.1"].artifact_name, "1.20.1+build.5");
    }

    #[test]
    fn test_merge_accepts_higher_build() {
        let mut registry = ReleaseRegistry::default();
        registry.merge_entries([entry("1.20.1", 5)]);

        assert!(registry.merge_entries([entry("1.20.1", 6)]));
        assert_eq!(registry.entries["1.20.1"].build, 6);
    }

    #[test]
    fn test_merge_never_reorders_known_ids() {
        let mut registry = ReleaseRegistry::default();
        registry.merge_entries([entry("b", 1), entry("a", 1)]);

        // Upstream now lists them the other way round plus a newcomer.
        assert!(registry.merge_entries([entry("c", 1), entry("a", 2), entry("b", 2)]));
        assert_eq!(registry.order, vec!["b", "a", "c"]);
        let keys: Vec<_> = registry.entries.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_combined_yarn_equality_covers_every_field() {
        let release = entry("1.20.1", 3);
        let time = DateTime::<Utc>::default();
        let a = CombinedYarn::from_release(&release, "1.20.1", time);
        let mut b = a.clone();
        assert_eq!(a, b);
        b.separator = ".".to_string();
        assert_ne!(a, b);
    }

    #[test]
    fn test_description_hash_uses_dataset_field_name() {
        let json = r#"{
            "version_id": "23w31a",
            "version_file_id": "23w31a",
            "version_release_time": "2023-08-01T12:00:00+00:00",
            "jar_key": "client",
            "jar_sha1_meta": "abc"
        }"#;
        let entry: DescriptionEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.content_hash, "abc");
        let jar = CombinedJar::from_description(&entry);
        assert!(serde_json::to_string(&jar).unwrap().contains("\"jar_sha1_meta\":\"abc\""));
    }
}
