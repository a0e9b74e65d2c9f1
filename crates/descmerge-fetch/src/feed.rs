//! Release feed client.
//!
//! The feed is the fabric meta `versions` endpoint; only its `mappings` array
//! is read. Each element maps 1:1 onto a [`ReleaseEntry`].

use descmerge_core::{ReleaseEntry, SyncError, SyncResult};
use serde::Deserialize;
use tracing::info;

use crate::transport::Transport;

/// Source of the current upstream release list.
pub trait ReleaseFeed {
    fn fetch(&self) -> SyncResult<Vec<ReleaseEntry>>;
}

#[derive(Debug, Deserialize)]
struct FeedDocument {
    mappings: Vec<FeedMapping>,
}

#[derive(Debug, Deserialize)]
struct FeedMapping {
    #[serde(rename = "gameVersion")]
    game_version: String,
    separator: String,
    build: u32,
    version: String,
}

impl From<FeedMapping> for ReleaseEntry {
    fn from(m: FeedMapping) -> Self {
        ReleaseEntry {
            version_file_id: m.game_version,
            separator: m.separator,
            build: m.build,
            artifact_name: m.version,
        }
    }
}

/// Parse a feed response body.
pub fn parse_feed(body: &str) -> SyncResult<Vec<ReleaseEntry>> {
    let doc: FeedDocument =
        serde_json::from_str(body).map_err(|e| SyncError::parse("release feed", e))?;
    Ok(doc.mappings.into_iter().map(ReleaseEntry::from).collect())
}

pub struct HttpReleaseFeed<T> {
    transport: T,
    url: String,
}

impl<T: Transport> HttpReleaseFeed<T> {
    pub fn new(transport: T, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }
}

impl<T: Transport> ReleaseFeed for HttpReleaseFeed<T> {
    fn fetch(&self) -> SyncResult<Vec<ReleaseEntry>> {
        info!(url = %self.url, "fetching release feed");
        let body = self.transport.get_text(&self.url)?;
        parse_feed(&body)
    }
}
