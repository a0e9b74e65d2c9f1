//! Commit and push the working root after a successful update.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use descmerge_core::SyncResult;
use descmerge_core::config::PublishConfig;
use tracing::info;

use crate::git::Git;

/// Commit everything under `root` as the bot identity and push it.
///
/// Returns `false` without committing when the work tree is clean.
pub fn publish(root: &Path, config: &PublishConfig) -> SyncResult<bool> {
    let git = Git::new(root);
    if !git.is_dirty()? {
        info!("nothing to publish");
        return Ok(false);
    }

    let message = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false);
    git.add_all()?;
    git.commit_as(&message, &config.bot_name, &config.bot_email)?;
    git.push()?;

    info!(%message, "published");
    Ok(true)
}
