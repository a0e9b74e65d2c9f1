//! Whole-document JSON persistence.
//!
//! Documents are read entirely at startup and rewritten entirely at the end of
//! a successful pass. A write goes to a temp file in the target directory and
//! is renamed into place, so readers never see a half-written document.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::types::{CombinedRoot, IndexRoot, ReleaseRegistry};

pub trait Document: Serialize + DeserializeOwned + Default {
    /// Short name used in logs and parse errors.
    const KIND: &'static str;

    /// Load the document, or an empty one if the file does not exist yet.
    fn load_or_default(path: &Path) -> SyncResult<Self> {
        if !path.exists() {
            info!(kind = Self::KIND, path = %path.display(), "document missing, starting empty");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    fn load(path: &Path) -> SyncResult<Self> {
        debug!(kind = Self::KIND, path = %path.display(), "loading document");
        let bytes = std::fs::read(path).map_err(|e| SyncError::io(path, e))?;
        serde_json::from_slice(&bytes).map_err(|e| SyncError::parse(Self::KIND, e))
    }

    fn to_pretty_json(&self) -> SyncResult<Vec<u8>> {
        let mut bytes =
            serde_json::to_vec_pretty(self).map_err(|e| SyncError::parse(Self::KIND, e))?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn save(&self, path: &Path) -> SyncResult<()> {
        let bytes = self.to_pretty_json()?;
        write_atomic(path, &bytes)?;
        info!(kind = Self::KIND, path = %path.display(), "document saved");
        Ok(())
    }
}

impl Document for ReleaseRegistry {
    const KIND: &'static str = "registry";
}

impl Document for CombinedRoot {
    const KIND: &'static str = "combined";
}

impl Document for IndexRoot {
    const KIND: &'static str = "index";
}

/// Replace `path` with `bytes` via a sibling temp file and a rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> SyncResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| SyncError::io(dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| SyncError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| SyncError::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| SyncError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| SyncError::io(path, e.error))?;
    Ok(())
}
