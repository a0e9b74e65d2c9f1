//! Release registry refresh.

use descmerge_core::{ReleaseRegistry, SyncResult};
use descmerge_fetch::ReleaseFeed;
use tracing::info;

/// Fold the current feed into `registry`. Returns whether it changed.
///
/// A failed fetch leaves the registry untouched.
pub fn refresh(registry: &mut ReleaseRegistry, feed: &dyn ReleaseFeed) -> SyncResult<bool> {
    let fetched = feed.fetch()?;
    let received = fetched.len();

    let dirty = registry.merge_entries(fetched);
    if dirty {
        info!(received, tracked = registry.entries.len(), "registry updated");
    } else {
        info!(received, "registry already up to date");
    }
    Ok(dirty)
}
