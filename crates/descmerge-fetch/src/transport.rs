//! Blocking HTTP GET, behind a trait.

use std::time::Duration;

use descmerge_core::{SyncError, SyncResult};
use tracing::debug;

/// Fetches whole response bodies. Non-success statuses are errors.
pub trait Transport {
    fn get_bytes(&self, url: &str) -> SyncResult<Vec<u8>>;

    fn get_text(&self, url: &str) -> SyncResult<String> {
        let bytes = self.get_bytes(url)?;
        String::from_utf8(bytes).map_err(|e| SyncError::RemoteFetch {
            url: url.to_string(),
            reason: format!("response is not utf-8: {e}"),
        })
    }
}

/// [`Transport`] over a `reqwest` blocking client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> SyncResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("descmerge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::RemoteFetch {
                url: String::new(),
                reason: format!("failed to build http client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get_bytes(&self, url: &str) -> SyncResult<Vec<u8>> {
        debug!(%url, "GET");
        let fetch_err = |reason: String| SyncError::RemoteFetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("status {status}")));
        }

        let body = response.bytes().map_err(|e| fetch_err(e.to_string()))?;
        Ok(body.to_vec())
    }
}
