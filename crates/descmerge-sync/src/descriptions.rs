//! Read-only view of the jar description dataset.
//!
//! The dataset is a separately maintained repository checked out under the
//! working root. Its `index.json` groups entries by version id, then jar key,
//! and carries a timestamp that only moves forward when the dataset changes.

use std::path::Path;

use chrono::{DateTime, Utc};
use descmerge_core::{DescriptionEntry, SyncError, SyncResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::git::Git;

pub const DATASET_INDEX_FILE: &str = "index.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptionIndex {
    pub timestamp: DateTime<Utc>,
    pub mappings: IndexMap<String, IndexMap<String, DescriptionEntry>>,
}

/// Identifiers of a game version as known to the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub version_id: String,
    pub version_file_id: String,
    pub version_release_time: DateTime<Utc>,
}

impl DescriptionIndex {
    pub fn load(dir: &Path) -> SyncResult<Self> {
        let path = dir.join(DATASET_INDEX_FILE);
        info!(path = %path.display(), "loading description dataset");
        let bytes = std::fs::read(&path).map_err(|e| SyncError::io(&path, e))?;
        serde_json::from_slice(&bytes).map_err(|e| SyncError::parse("description dataset", e))
    }

    /// Pull the dataset checkout and reload it.
    ///
    /// Returns the reloaded dataset and whether its timestamp moved past
    /// `previous`.
    pub fn pull(
        dir: &Path,
        remote: &str,
        branch: &str,
        previous: DateTime<Utc>,
    ) -> SyncResult<(Self, bool)> {
        info!(dir = %dir.display(), remote, branch, "pulling description dataset");
        Git::new(dir).pull(remote, branch)?;

        let latest = Self::load(dir)?;
        let changed = latest.timestamp != previous;
        if changed {
            info!(timestamp = %latest.timestamp, "description dataset updated");
        } else {
            info!("description dataset already up to date");
        }
        Ok((latest, changed))
    }

    /// Every entry, grouped by version then jar.
    pub fn entries(&self) -> impl Iterator<Item = &DescriptionEntry> {
        self.mappings.values().flat_map(|jars| jars.values())
    }

    /// Resolve a version id or version file id.
    pub fn resolve(&self, token: &str) -> SyncResult<ResolvedVersion> {
        self.entries()
            .find(|e| e.version_id == token || e.version_file_id == token)
            .map(|e| ResolvedVersion {
                version_id: e.version_id.clone(),
                version_file_id: e.version_file_id.clone(),
                version_release_time: e.version_release_time,
            })
            .ok_or_else(|| SyncError::NotFound(format!("version {token} in description dataset")))
    }

    /// Description entries for a version id, in dataset order.
    pub fn jars_for(&self, version_id: &str) -> SyncResult<Vec<&DescriptionEntry>> {
        self.mappings
            .get(version_id)
            .map(|jars| jars.values().collect())
            .ok_or_else(|| SyncError::NotFound(format!("jars for version {version_id}")))
    }
}
