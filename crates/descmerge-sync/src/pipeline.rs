//! End-to-end update: registry, combined, index, then persistence.
//!
//! Every document is read up front and written only after every stage has
//! succeeded. A failure anywhere leaves all three documents as they were.

use chrono::Utc;
use descmerge_core::{
    CombinedRoot, DescmergeConfig, Document, IndexRoot, Layout, ReleaseRegistry, SyncResult,
};
use descmerge_fetch::{ArtifactStore, ReleaseFeed};
use descmerge_merge::MergeTool;
use tracing::info;

use crate::descriptions::DescriptionIndex;
use crate::index::IndexProjector;
use crate::publish::publish;
use crate::reconcile::Reconciler;
use crate::registry;

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    /// `git pull` the description dataset before reading it.
    pub pull_descriptions: bool,
    /// Commit and push the working root afterwards.
    pub push: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub descriptions_changed: bool,
    pub registry_dirty: bool,
    pub combined_dirty: bool,
    pub index_dirty: bool,
    pub published: bool,
}

impl UpdateReport {
    pub fn any_dirty(&self) -> bool {
        self.registry_dirty || self.combined_dirty || self.index_dirty
    }
}

pub struct Pipeline<'a> {
    config: &'a DescmergeConfig,
    layout: &'a Layout,
    feed: &'a dyn ReleaseFeed,
    artifacts: &'a dyn ArtifactStore,
    merger: &'a dyn MergeTool,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a DescmergeConfig,
        layout: &'a Layout,
        feed: &'a dyn ReleaseFeed,
        artifacts: &'a dyn ArtifactStore,
        merger: &'a dyn MergeTool,
    ) -> Self {
        Self {
            config,
            layout,
            feed,
            artifacts,
            merger,
        }
    }

    fn reconciler(&self) -> Reconciler<'_> {
        Reconciler::new(
            self.layout,
            self.artifacts,
            self.merger,
            self.config.merge.format.clone(),
        )
    }

    fn projector(&self) -> IndexProjector {
        IndexProjector::new(self.layout.clone(), self.config.publish.base_url.clone())
    }

    fn descriptions(&self, pull: bool, previous: &CombinedRoot) -> SyncResult<(DescriptionIndex, bool)> {
        let dir = self.layout.descriptions_dir();
        if pull {
            DescriptionIndex::pull(
                &dir,
                &self.config.publish.descriptions_remote,
                &self.config.publish.descriptions_branch,
                previous.jar_descs_timestamp,
            )
        } else {
            let index = DescriptionIndex::load(&dir)?;
            let changed = index.timestamp != previous.jar_descs_timestamp;
            Ok((index, changed))
        }
    }

    /// Run a full update pass.
    pub fn run(&self, options: UpdateOptions) -> SyncResult<UpdateReport> {
        let mut report = UpdateReport::default();

        let mut registry = ReleaseRegistry::load_or_default(&self.layout.registry_document())?;
        let mut combined = CombinedRoot::load_or_default(&self.layout.combined_document())?;
        let mut index = IndexRoot::load_or_default(&self.layout.index_document())?;

        let (descriptions, descriptions_changed) =
            self.descriptions(options.pull_descriptions, &combined)?;
        report.descriptions_changed = descriptions_changed;

        report.registry_dirty = registry::refresh(&mut registry, self.feed)?;
        if report.registry_dirty {
            registry.timestamp = Utc::now();
        }

        let observed = (combined.fabric_timestamp, combined.jar_descs_timestamp);
        report.combined_dirty = self
            .reconciler()
            .reconcile(&mut combined, &registry, &descriptions)?;
        if report.combined_dirty {
            combined.timestamp = Utc::now();
        }
        let sources_advanced =
            observed != (combined.fabric_timestamp, combined.jar_descs_timestamp);

        report.index_dirty = self.projector().refresh(&mut index, &combined);

        if report.registry_dirty {
            registry.save(&self.layout.registry_document())?;
        }
        if report.combined_dirty || sources_advanced {
            combined.save(&self.layout.combined_document())?;
        }
        if report.index_dirty {
            index.save(&self.layout.index_document())?;
        }

        if options.push {
            report.published = publish(self.layout.root(), &self.config.publish)?;
        }

        info!(?report, "update finished");
        Ok(report)
    }

    /// Refresh and persist the registry document only.
    pub fn refresh_registry(&self) -> SyncResult<bool> {
        let path = self.layout.registry_document();
        let mut registry = ReleaseRegistry::load_or_default(&path)?;
        let dirty = registry::refresh(&mut registry, self.feed)?;
        if dirty {
            registry.timestamp = Utc::now();
            registry.save(&path)?;
        }
        Ok(dirty)
    }

    /// Reconcile the combined document against the saved registry.
    ///
    /// With `force`, every stored merged mapping is regenerated afterwards.
    pub fn combine(&self, force: bool) -> SyncResult<bool> {
        let registry = ReleaseRegistry::load_or_default(&self.layout.registry_document())?;
        let path = self.layout.combined_document();
        let mut combined = CombinedRoot::load_or_default(&path)?;
        let (descriptions, _) = self.descriptions(false, &combined)?;

        let observed = (combined.fabric_timestamp, combined.jar_descs_timestamp);
        let reconciler = self.reconciler();
        let dirty = reconciler.reconcile(&mut combined, &registry, &descriptions)?;
        if force {
            let generated = reconciler.regenerate_all(&combined)?;
            info!(generated, "regenerated merged mappings");
        }

        if dirty {
            combined.timestamp = Utc::now();
        }
        if dirty || observed != (combined.fabric_timestamp, combined.jar_descs_timestamp) {
            combined.save(&path)?;
        }
        Ok(dirty)
    }

    /// Rebuild the index document from the saved combined document.
    pub fn project_index(&self) -> SyncResult<bool> {
        let combined = CombinedRoot::load_or_default(&self.layout.combined_document())?;
        let path = self.layout.index_document();
        let mut index = IndexRoot::load_or_default(&path)?;
        let dirty = self.projector().refresh(&mut index, &combined);
        if dirty {
            index.save(&path)?;
        }
        Ok(dirty)
    }
}
