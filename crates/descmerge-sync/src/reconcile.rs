//! Reconciliation of the combined document.
//!
//! For every version in registry order the stored yarn and jar snapshots are
//! compared by value against snapshots built from the current registry entry
//! and description dataset:
//!
//! - a new version fetches its naming artifact and merges every jar;
//! - a changed yarn re-fetches the artifact and re-merges every current jar;
//! - a new or changed jar re-merges only that jar.
//!
//! The pass works on a copy of the combined root and only swaps it in once
//! every fetch and merge has succeeded, so a failure leaves the caller's
//! state exactly as it was.

use descmerge_core::{
    CombinedJar, CombinedRoot, CombinedVersion, CombinedYarn, DescriptionEntry, Layout,
    ReleaseEntry, ReleaseRegistry, SyncResult,
};
use descmerge_fetch::ArtifactStore;
use descmerge_merge::{MergeRequest, MergeTool};
use indexmap::IndexMap;
use tracing::{error, info};

use crate::descriptions::{DescriptionIndex, ResolvedVersion};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VersionOutcome {
    Initialized,
    Updated,
    Skipped,
}

impl VersionOutcome {
    fn label(self) -> &'static str {
        match self {
            VersionOutcome::Initialized => "initialized",
            VersionOutcome::Updated => "updated",
            VersionOutcome::Skipped => "skipped",
        }
    }
}

pub struct Reconciler<'a> {
    layout: &'a Layout,
    artifacts: &'a dyn ArtifactStore,
    merger: &'a dyn MergeTool,
    format: String,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        layout: &'a Layout,
        artifacts: &'a dyn ArtifactStore,
        merger: &'a dyn MergeTool,
        format: impl Into<String>,
    ) -> Self {
        Self {
            layout,
            artifacts,
            merger,
            format: format.into(),
        }
    }

    /// Bring `root` in line with `registry` and `descriptions`.
    ///
    /// Returns whether any version was created or changed. The observed
    /// source timestamps are recorded either way.
    pub fn reconcile(
        &self,
        root: &mut CombinedRoot,
        registry: &ReleaseRegistry,
        descriptions: &DescriptionIndex,
    ) -> SyncResult<bool> {
        if root.fabric_timestamp == registry.timestamp
            && root.jar_descs_timestamp == descriptions.timestamp
        {
            info!("combined already up to date");
            return Ok(false);
        }

        let mut next = root.clone();
        let mut dirty = false;
        let total = registry.order.len();

        for (i, version_file_id) in registry.order.iter().enumerate() {
            let Some(entry) = registry.entries.get(version_file_id) else {
                continue;
            };

            let resolved = descriptions
                .resolve(version_file_id)
                .map_err(|e| e.at_stage("resolve", version_file_id))?;
            let version_id = resolved.version_id.clone();
            let jars = descriptions
                .jars_for(&version_id)
                .map_err(|e| e.at_stage("resolve", &version_id))?;

            let outcome = match next.combined.get_mut(&version_id) {
                None => {
                    let version = self.create_version(entry, &resolved, &jars)?;
                    next.combined.insert(version_id.clone(), version);
                    VersionOutcome::Initialized
                }
                Some(existing) => {
                    if self.update_version(existing, entry, &jars)? {
                        VersionOutcome::Updated
                    } else {
                        VersionOutcome::Skipped
                    }
                }
            };

            if outcome != VersionOutcome::Skipped {
                dirty = true;
            }
            info!("{} {} {}", progress(i + 1, total), version_id, outcome.label());
        }

        // Stored versions carry the registry id, which may differ from the
        // dataset's file id when resolution went through `version_id`.
        if dirty {
            let positions = registry.positions();
            next.combined.sort_by(|_, a, _, b| {
                let pa = positions.get(a.version_file_id.as_str()).copied().unwrap_or(usize::MAX);
                let pb = positions.get(b.version_file_id.as_str()).copied().unwrap_or(usize::MAX);
                pa.cmp(&pb)
            });
        }

        next.fabric_timestamp = registry.timestamp;
        next.jar_descs_timestamp = descriptions.timestamp;
        *root = next;

        info!(dirty, "combined reconciliation done");
        Ok(dirty)
    }

    /// Re-run the merge for every stored jar without touching state.
    ///
    /// Returns the number of merged mapping files produced.
    pub fn regenerate_all(&self, root: &CombinedRoot) -> SyncResult<usize> {
        let mut generated = 0;
        for version in root.combined.values() {
            self.fetch(&version.yarn)?;
            for jar in version.jars.values() {
                self.merge(jar, &version.yarn)?;
                generated += 1;
            }
        }
        Ok(generated)
    }

    fn create_version(
        &self,
        entry: &ReleaseEntry,
        resolved: &ResolvedVersion,
        descriptions: &[&DescriptionEntry],
    ) -> SyncResult<CombinedVersion> {
        let yarn = CombinedYarn::from_release(
            entry,
            &resolved.version_id,
            resolved.version_release_time,
        );
        self.fetch(&yarn)?;

        let mut jars: IndexMap<String, CombinedJar> = descriptions
            .iter()
            .map(|d| (d.jar_key.clone(), CombinedJar::from_description(d)))
            .collect();
        jars.sort_keys();

        for jar in jars.values() {
            self.merge(jar, &yarn)?;
        }

        Ok(CombinedVersion {
            version_id: resolved.version_id.clone(),
            version_file_id: entry.version_file_id.clone(),
            version_release_time: resolved.version_release_time,
            yarn,
            jars,
        })
    }

    fn update_version(
        &self,
        version: &mut CombinedVersion,
        entry: &ReleaseEntry,
        descriptions: &[&DescriptionEntry],
    ) -> SyncResult<bool> {
        let mut dirty = false;
        let mut yarn_dirty = false;

        let yarn = CombinedYarn::from_release(
            entry,
            &version.version_id,
            version.version_release_time,
        );
        if version.yarn != yarn {
            self.fetch(&yarn)?;
            version.yarn = yarn;
            dirty = true;
            yarn_dirty = true;
        }

        let mut jars_changed = false;
        for description in descriptions {
            let jar = CombinedJar::from_description(description);
            let jar_dirty = version.jars.get(&jar.jar_key) != Some(&jar);

            if jar_dirty {
                version.jars.insert(jar.jar_key.clone(), jar.clone());
                dirty = true;
                jars_changed = true;
            }

            if yarn_dirty || jar_dirty {
                self.merge(&jar, &version.yarn)?;
            }
        }

        if jars_changed {
            version.jars.sort_keys();
        }

        Ok(dirty)
    }

    fn fetch(&self, yarn: &CombinedYarn) -> SyncResult<()> {
        self.artifacts.ensure(yarn).map_err(|e| {
            error!(version_id = %yarn.version_id, artifact = %yarn.artifact_name, error = %e, "artifact fetch failed");
            e.at_stage("fetch", &yarn.version_id)
        })
    }

    fn merge(&self, jar: &CombinedJar, yarn: &CombinedYarn) -> SyncResult<()> {
        let request = MergeRequest {
            naming: self.layout.yarn_path(yarn),
            descriptions: self.layout.jar_description_path(jar),
            output: self.layout.jar_output_path(jar),
            format: self.format.clone(),
        };
        self.merger.generate(&request).map_err(|e| {
            error!(version_id = %jar.version_id, jar_key = %jar.jar_key, error = %e, "merge failed");
            e.at_stage("merge", &jar.version_id)
        })
    }
}

fn progress(done: usize, total: usize) -> String {
    let width = total.to_string().len();
    format!("[{done:>width$}/{total}]")
}
