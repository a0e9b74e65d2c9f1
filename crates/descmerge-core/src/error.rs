//! Error types shared by every descmerge crate.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for descmerge operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can abort an update pass.
///
/// Every variant is fatal for the pass that raised it. Dirtiness checks never
/// produce errors; they are plain value comparisons.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A version token did not resolve in the registry or description dataset.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("remote fetch failed for {url}: {reason}")]
    RemoteFetch { url: String, reason: String },

    #[error("{tool} failed ({status}): {stderr}")]
    ExternalTool {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Wraps a failure with the version and stage it happened in.
    #[error("{stage} failed for version {version_id}: {source}")]
    Stage {
        stage: &'static str,
        version_id: String,
        #[source]
        source: Box<SyncError>,
    },
}

impl SyncError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(what: impl Into<String>, reason: impl ToString) -> Self {
        SyncError::Parse {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    /// Attach the version and stage to an error raised while processing it.
    pub fn at_stage(self, stage: &'static str, version_id: &str) -> Self {
        SyncError::Stage {
            stage,
            version_id: version_id.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any `Stage` wrappers.
    pub fn root_cause(&self) -> &SyncError {
        match self {
            SyncError::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
