//! Upstream access for descmerge.
//!
//! Everything that touches the network goes through [`Transport`], so the
//! release feed and the artifact cache can be exercised without a server.

pub mod artifact;
pub mod feed;
pub mod transport;

pub use artifact::{ArtifactFetcher, ArtifactStore};
pub use feed::{HttpReleaseFeed, ReleaseFeed};
pub use transport::{HttpTransport, Transport};
