//! descmerge.toml configuration parser.
//!
//! Every field has a default, so a missing file (or an empty one) yields the
//! configuration used by the public fabric-yarn-merged-descs deployment.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

pub const CONFIG_FILE_NAME: &str = "descmerge.toml";

/// Environment override for the merge tool executable.
pub const MERGE_PROGRAM_ENV: &str = "DESCMERGE_MERGE_PROGRAM";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescmergeConfig {
    pub paths: PathsConfig,
    pub upstream: UpstreamConfig,
    pub merge: MergeConfig,
    pub publish: PublishConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub mappings_dir: String,
    pub descriptions_dir: String,
    pub registry_document: String,
    pub combined_document: String,
    pub index_document: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            mappings_dir: "mappings".to_string(),
            descriptions_dir: "minecraft-jars-java-descriptions".to_string(),
            registry_document: "fabric.json".to_string(),
            combined_document: "combined.json".to_string(),
            index_document: "index.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub versions_url: String,
    pub maven_url: String,
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            versions_url: "https://meta.fabricmc.net/v2/versions".to_string(),
            maven_url: "https://maven.fabricmc.net/net/fabricmc/yarn".to_string(),
            timeout_secs: 60,
        }
    }
}

/// How the external merge tool is launched.
///
/// The tool runs as `<program> <args...> <descriptions> <naming> <output> <format>`
/// with the working root as its current directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub program: String,
    pub args: Vec<String>,
    pub format: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            program: "java".to_string(),
            args: vec![
                "-jar".to_string(),
                "mapping-io-cli-0.3.0-all.jar".to_string(),
                "yarnfulldescs".to_string(),
            ],
            format: "JSON".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Public base URL the merged mapping files are served under.
    pub base_url: String,
    pub bot_name: String,
    pub bot_email: String,
    pub descriptions_remote: String,
    pub descriptions_branch: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            base_url: "https://jackassmc.github.io/fabric-yarn-merged-descs".to_string(),
            bot_name: "github-actions[bot]".to_string(),
            bot_email: "github-actions[bot]@users.noreply.github.com".to_string(),
            descriptions_remote: "origin".to_string(),
            descriptions_branch: "master".to_string(),
        }
    }
}

impl DescmergeConfig {
    pub fn from_file(path: &Path) -> SyncResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SyncError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> SyncResult<Self> {
        let mut config: DescmergeConfig =
            toml::from_str(content).map_err(|e| SyncError::Config(e.to_string()))?;
        config.apply_env();
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> SyncResult<Self> {
        if path.is_file() {
            tracing::debug!(path = %path.display(), "loading config");
            Self::from_file(path)
        } else {
            let mut config = Self::default();
            config.apply_env();
            Ok(config)
        }
    }

    pub fn to_toml_string(&self) -> SyncResult<String> {
        toml::to_string_pretty(self).map_err(|e| SyncError::Config(e.to_string()))
    }

    fn apply_env(&mut self) {
        if let Ok(program) = std::env::var(MERGE_PROGRAM_ENV) {
            if !program.is_empty() {
                self.merge.program = program;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config: DescmergeConfig = toml::from_str("").unwrap();
        assert_eq!(config.paths.mappings_dir, "mappings");
        assert_eq!(config.merge.format, "JSON");
        assert_eq!(config.upstream.timeout_secs, 60);
    }

    #[test]
    fn test_parse_partial_section() {
        let toml_str = r#"
[upstream]
maven_url = "http://localhost:8080/yarn"

[merge]
args = ["-jar", "tools/mio.jar", "yarnfulldescs"]
"#;
        let config: DescmergeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.upstream.maven_url, "http://localhost:8080/yarn");
        assert_eq!(
            config.upstream.versions_url,
            "https://meta.fabricmc.net/v2/versions"
        );
        assert_eq!(config.merge.args[1], "tools/mio.jar");
        assert_eq!(config.merge.program, "java");
    }

    #[test]
    fn test_rejects_unknown_types() {
        let err = DescmergeConfig::from_toml_str("[upstream]\ntimeout_secs = \"soon\"\n").unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn test_round_trip_to_toml() {
        let toml_str = DescmergeConfig::default().to_toml_string().unwrap();
        assert!(toml_str.contains("[publish]"));
        assert!(toml_str.contains("jackassmc.github.io"));
    }
}
