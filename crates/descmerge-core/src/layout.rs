//! On-disk layout of a descmerge working root.
//!
//! Paths handed out here are relative to the root: they are what gets
//! recorded in the index document and passed to the merge tool, which runs
//! with the root as its current directory. Use [`Layout::absolute`] for
//! filesystem access from this process.

use std::path::{Path, PathBuf};

use crate::config::{DescmergeConfig, PathsConfig};
use crate::types::{CombinedJar, CombinedYarn};

#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
    paths: PathsConfig,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>, config: &DescmergeConfig) -> Self {
        Self {
            root: root.into(),
            paths: config.paths.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn absolute(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    pub fn mappings_dir(&self) -> PathBuf {
        PathBuf::from(&self.paths.mappings_dir)
    }

    pub fn descriptions_dir(&self) -> PathBuf {
        self.root.join(&self.paths.descriptions_dir)
    }

    pub fn registry_document(&self) -> PathBuf {
        self.root.join(&self.paths.registry_document)
    }

    pub fn combined_document(&self) -> PathBuf {
        self.root.join(&self.paths.combined_document)
    }

    pub fn index_document(&self) -> PathBuf {
        self.root.join(&self.paths.index_document)
    }

    /// Decompressed naming artifact for a version.
    pub fn yarn_path(&self, yarn: &CombinedYarn) -> PathBuf {
        self.mappings_dir()
            .join(format!("{}-yarn.tiny", yarn.version_id))
    }

    /// Cached compressed copy of the naming artifact.
    pub fn yarn_cache_path(&self, yarn: &CombinedYarn) -> PathBuf {
        self.mappings_dir()
            .join(format!("{}-yarn.tiny.gz", yarn.version_id))
    }

    /// Description file in the dataset checkout for a jar.
    pub fn jar_description_path(&self, jar: &CombinedJar) -> PathBuf {
        PathBuf::from(&self.paths.descriptions_dir)
            .join("mappings")
            .join(format!("{}-{}.tiny", jar.version_id, jar.jar_key))
    }

    /// Merged mapping file produced for a jar.
    pub fn jar_output_path(&self, jar: &CombinedJar) -> PathBuf {
        self.mappings_dir()
            .join(format!("{}-{}.json", jar.version_id, jar.jar_key))
    }
}

/// Render a relative path with forward slashes, for documents and URLs.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
