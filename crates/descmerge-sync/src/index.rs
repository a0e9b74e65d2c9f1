//! Public index projection of the combined document.

use descmerge_core::layout::to_slash;
use descmerge_core::{CombinedJar, CombinedRoot, CombinedVersion, IndexJar, IndexRoot, IndexVersion, Layout};
use tracing::info;

pub struct IndexProjector {
    layout: Layout,
    base_url: String,
}

impl IndexProjector {
    pub fn new(layout: Layout, base_url: impl Into<String>) -> Self {
        Self {
            layout,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Rebuild `index` from `root` if it is stale. Returns whether it was.
    pub fn refresh(&self, index: &mut IndexRoot, root: &CombinedRoot) -> bool {
        if index.timestamp == root.timestamp {
            info!("index already up to date");
            return false;
        }
        *index = self.rebuild(root);
        info!(versions = index.versions.len(), "index rebuilt");
        true
    }

    /// Project the whole combined root. Nothing from a previous index survives.
    pub fn rebuild(&self, root: &CombinedRoot) -> IndexRoot {
        IndexRoot {
            timestamp: root.timestamp,
            versions: root
                .combined
                .iter()
                .map(|(version_id, version)| (version_id.clone(), self.version(version)))
                .collect(),
        }
    }

    fn version(&self, version: &CombinedVersion) -> IndexVersion {
        IndexVersion {
            version_id: version.version_id.clone(),
            version_file_id: version.version_file_id.clone(),
            version_release_time: version.version_release_time,
            yarn_build: version.yarn.build,
            jars: version
                .jars
                .iter()
                .map(|(key, jar)| (key.clone(), self.jar(jar, version.yarn.build)))
                .collect(),
        }
    }

    fn jar(&self, jar: &CombinedJar, yarn_build: u32) -> IndexJar {
        let path = to_slash(&self.layout.jar_output_path(jar));
        IndexJar {
            version_id: jar.version_id.clone(),
            version_file_id: jar.version_file_id.clone(),
            version_release_time: jar.version_release_time,
            yarn_build,
            jar_key: jar.jar_key.clone(),
            url: format!("{}/{path}", self.base_url),
            path,
        }
    }
}
