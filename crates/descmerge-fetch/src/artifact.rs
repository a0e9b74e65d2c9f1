//! Cache-aware download of the naming artifact for a release build.
//!
//! The compressed blob is kept next to its decompressed copy. When both exist,
//! only the remote `.sha1` sidecar is fetched and compared with the SHA-1 of
//! the local blob; a full download happens on mismatch or when either file is
//! missing. Nothing is written until the download has been decompressed in
//! memory.

use std::io::Read;
use std::path::Path;

use descmerge_core::document::write_atomic;
use descmerge_core::{CombinedYarn, Layout, SyncError, SyncResult};
use flate2::read::GzDecoder;
use sha1::{Digest, Sha1};
use tracing::{debug, info};

use crate::transport::Transport;

/// Makes the naming artifact for a yarn snapshot available on disk.
pub trait ArtifactStore {
    fn ensure(&self, yarn: &CombinedYarn) -> SyncResult<()>;
}

pub struct ArtifactFetcher<T> {
    transport: T,
    layout: Layout,
    maven_url: String,
}

impl<T: Transport> ArtifactFetcher<T> {
    pub fn new(transport: T, layout: Layout, maven_url: impl Into<String>) -> Self {
        Self {
            transport,
            layout,
            maven_url: maven_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `<maven>/<name>/yarn-<name>-tiny.gz`
    pub fn artifact_url(&self, yarn: &CombinedYarn) -> String {
        format!(
            "{}/{name}/yarn-{name}-tiny.gz",
            self.maven_url,
            name = yarn.artifact_name
        )
    }

    fn cache_hit(&self, url: &str, cache: &Path, artifact: &Path) -> SyncResult<bool> {
        if !(cache.is_file() && artifact.is_file()) {
            return Ok(false);
        }

        let remote = self.transport.get_text(&format!("{url}.sha1"))?;
        let local = sha1_file(cache)?;
        Ok(remote.trim().eq_ignore_ascii_case(&local))
    }
}

impl<T: Transport> ArtifactStore for ArtifactFetcher<T> {
    fn ensure(&self, yarn: &CombinedYarn) -> SyncResult<()> {
        let url = self.artifact_url(yarn);
        let cache = self.layout.absolute(&self.layout.yarn_cache_path(yarn));
        let artifact = self.layout.absolute(&self.layout.yarn_path(yarn));

        if self.cache_hit(&url, &cache, &artifact)? {
            debug!(%url, "artifact cache hit");
            return Ok(());
        }

        info!(%url, "downloading artifact");
        let compressed = self.transport.get_bytes(&url)?;
        let text = decompress(&compressed).map_err(|reason| SyncError::RemoteFetch {
            url: url.clone(),
            reason,
        })?;

        // The cache blob validates the pair, so it goes last.
        write_atomic(&artifact, text.as_bytes())?;
        write_atomic(&cache, &compressed)?;
        Ok(())
    }
}

fn decompress(compressed: &[u8]) -> Result<String, String> {
    let mut text = String::new();
    GzDecoder::new(compressed)
        .read_to_string(&mut text)
        .map_err(|e| format!("invalid gzip payload: {e}"))?;
    Ok(text)
}

/// SHA-1 of a file as lowercase hex.
pub fn sha1_file(path: &Path) -> SyncResult<String> {
    let bytes = std::fs::read(path).map_err(|e| SyncError::io(path, e))?;
    Ok(hex::encode(Sha1::digest(&bytes)))
}
