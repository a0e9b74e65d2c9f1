pub mod stages;
pub mod update;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, Result, bail};
use descmerge_core::config::CONFIG_FILE_NAME;
use descmerge_core::{DescmergeConfig, Layout};
use descmerge_fetch::{ArtifactFetcher, HttpReleaseFeed, HttpTransport};
use descmerge_merge::{MappingIoCli, program_available};
use descmerge_sync::Pipeline;

/// Everything a command needs, built once from the root and config.
pub struct Context {
    pub config: DescmergeConfig,
    pub layout: Layout,
    feed: HttpReleaseFeed<HttpTransport>,
    artifacts: ArtifactFetcher<HttpTransport>,
    merger: MappingIoCli,
}

impl Context {
    pub fn load(root: &Path, config_path: Option<&Path>) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("working root {} not found", root.display()))?;
        let config_path: PathBuf = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.join(CONFIG_FILE_NAME));
        let config = DescmergeConfig::load_or_default(&config_path)?;

        tracing::debug!(root = %root.display(), config = %config_path.display(), "loaded context");

        let layout = Layout::new(&root, &config);
        let transport = HttpTransport::new(Duration::from_secs(config.upstream.timeout_secs))?;

        Ok(Self {
            feed: HttpReleaseFeed::new(transport.clone(), &config.upstream.versions_url),
            artifacts: ArtifactFetcher::new(transport, layout.clone(), &config.upstream.maven_url),
            merger: MappingIoCli::new(&config.merge, &root),
            layout,
            config,
        })
    }

    /// Fail early when the configured merge program cannot be run.
    pub fn require_merge_tool(&self) -> Result<()> {
        let program = Path::new(&self.config.merge.program);
        if !program_available(program) {
            bail!(
                "Merge tool not found at {}.\n\
                 Set [merge] program in {} or DESCMERGE_MERGE_PROGRAM.",
                program.display(),
                CONFIG_FILE_NAME
            );
        }
        Ok(())
    }

    pub fn pipeline(&self) -> Pipeline<'_> {
        Pipeline::new(
            &self.config,
            &self.layout,
            &self.feed,
            &self.artifacts,
            &self.merger,
        )
    }
}
