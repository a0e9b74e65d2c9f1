//! descmerge-sync: incremental reconciliation of upstream naming builds and
//! the jar description dataset into per-version merged mappings.
//!
//! # Flow
//!
//! 1. [`registry::refresh`] folds the release feed into the registry document.
//! 2. [`Reconciler::reconcile`] compares the registry and the description
//!    dataset against the combined document and regenerates exactly the
//!    merged mappings whose inputs changed.
//! 3. [`IndexProjector`] rebuilds the public index whenever the combined
//!    document's timestamp moved.
//!
//! [`Pipeline`] chains the three and persists every dirty document only once
//! all of them have succeeded.

pub mod descriptions;
pub mod git;
pub mod index;
pub mod pipeline;
pub mod publish;
pub mod reconcile;
pub mod registry;

pub use descriptions::{DescriptionIndex, ResolvedVersion};
pub use index::IndexProjector;
pub use pipeline::{Pipeline, UpdateOptions, UpdateReport};
pub use reconcile::Reconciler;
