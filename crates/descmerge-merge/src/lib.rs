//! Merge step: combine one naming artifact with one description file.
//!
//! The merge itself is done by an external, independently versioned tool
//! (mapping-io-cli by default). This crate only launches it and checks the
//! exit status; the produced file is treated as opaque.
//!
//! Invocation:
//!
//! ```text
//! <program> <args...> <descriptions> <naming> <output> <format>
//! ```
//!
//! run with the working root as the current directory, so every path is
//! passed relative to it.

use std::path::{Path, PathBuf};
use std::process::Command;

use descmerge_core::config::MergeConfig;
use descmerge_core::{SyncError, SyncResult};
use tracing::{debug, info};

/// One merge invocation. Paths are relative to the working root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    pub naming: PathBuf,
    pub descriptions: PathBuf,
    pub output: PathBuf,
    pub format: String,
}

pub trait MergeTool {
    fn generate(&self, request: &MergeRequest) -> SyncResult<()>;
}

/// [`MergeTool`] that shells out to mapping-io-cli (or whatever `program`
/// and `args` are configured to).
#[derive(Debug, Clone)]
pub struct MappingIoCli {
    program: PathBuf,
    args: Vec<String>,
    work_dir: PathBuf,
}

impl MappingIoCli {
    pub fn new(config: &MergeConfig, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from(&config.program),
            args: config.args.clone(),
            work_dir: work_dir.into(),
        }
    }

    fn tool_name(&self) -> String {
        self.program.display().to_string()
    }

    fn command(&self, request: &MergeRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(&request.descriptions)
            .arg(&request.naming)
            .arg(&request.output)
            .arg(&request.format)
            .current_dir(&self.work_dir);
        cmd
    }
}

impl MergeTool for MappingIoCli {
    fn generate(&self, request: &MergeRequest) -> SyncResult<()> {
        if let Some(parent) = request.output.parent() {
            let dir = self.work_dir.join(parent);
            std::fs::create_dir_all(&dir).map_err(|e| SyncError::io(dir, e))?;
        }

        let mut cmd = self.command(request);
        info!(output = %request.output.display(), "running merge tool");
        debug!("Running: {:?}", cmd);

        let output = cmd.output().map_err(|e| SyncError::ExternalTool {
            tool: self.tool_name(),
            status: "failed to start".to_string(),
            stderr: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(SyncError::ExternalTool {
                tool: self.tool_name(),
                status: match output.status.code() {
                    Some(code) => format!("exit code {code}"),
                    None => "terminated by signal".to_string(),
                },
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

/// Whether `program` looks runnable: an existing file when given as a path,
/// otherwise assumed to be resolved from `$PATH` at spawn time.
pub fn program_available(program: &Path) -> bool {
    if program.components().count() > 1 {
        program.is_file()
    } else {
        true
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sh(script: &str) -> MergeConfig {
        MergeConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "merge".to_string()],
            format: "JSON".to_string(),
        }
    }

    fn request() -> MergeRequest {
        MergeRequest {
            naming: PathBuf::from("mappings/1.20.1-yarn.tiny"),
            descriptions: PathBuf::from("descs/mappings/1.20.1-client.tiny"),
            output: PathBuf::from("mappings/1.20.1-client.json"),
            format: "JSON".to_string(),
        }
    }

    #[test]
    fn test_passes_positional_arguments_relative_to_root() {
        let dir = TempDir::new().unwrap();
        let tool = MappingIoCli::new(&sh(r#"printf '%s\n' "$@" > "$3""#), dir.path());

        tool.generate(&request()).unwrap();

        let written = fs::read_to_string(dir.path().join("mappings/1.20.1-client.json")).unwrap();
        let args: Vec<_> = written.lines().collect();
        assert_eq!(
            args,
            vec![
                "descs/mappings/1.20.1-client.tiny",
                "mappings/1.20.1-yarn.tiny",
                "mappings/1.20.1-client.json",
                "JSON",
            ]
        );
    }

    #[test]
    fn test_non_zero_exit_is_external_tool_error() {
        let dir = TempDir::new().unwrap();
        let tool = MappingIoCli::new(&sh("echo broken input >&2; exit 3"), dir.path());

        let err = tool.generate(&request()).unwrap_err();
        match err {
            SyncError::ExternalTool { status, stderr, .. } => {
                assert_eq!(status, "exit code 3");
                assert_eq!(stderr, "broken input");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_program_is_external_tool_error() {
        let dir = TempDir::new().unwrap();
        let config = MergeConfig {
            program: dir.path().join("no-such-tool").display().to_string(),
            ..MergeConfig::default()
        };
        assert!(!program_available(Path::new(&config.program)));

        let tool = MappingIoCli::new(&config, dir.path());
        assert!(matches!(
            tool.generate(&request()),
            Err(SyncError::ExternalTool { .. })
        ));
    }
}
