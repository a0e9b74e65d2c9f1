//! Minimal git driver for the dataset checkout and the publish step.

use std::path::{Path, PathBuf};
use std::process::Command;

use descmerge_core::{SyncError, SyncResult};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Git {
    dir: PathBuf,
}

impl Git {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run `git <args>` in the repository and return its stdout.
    pub fn run<I, S>(&self, args: I) -> SyncResult<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(&self.dir);
        debug!("Running: {:?}", cmd);

        let output = cmd.output().map_err(|e| SyncError::ExternalTool {
            tool: "git".to_string(),
            status: "failed to start".to_string(),
            stderr: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(SyncError::ExternalTool {
                tool: "git".to_string(),
                status: match output.status.code() {
                    Some(code) => format!("exit code {code}"),
                    None => "terminated by signal".to_string(),
                },
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    pub fn pull(&self, remote: &str, branch: &str) -> SyncResult<()> {
        self.run(["pull", remote, branch]).map(|_| ())
    }

    /// True when the work tree has modified or untracked files.
    pub fn is_dirty(&self) -> SyncResult<bool> {
        let status = self.run(["status", "--porcelain", "--untracked-files=all"])?;
        Ok(!status.trim().is_empty())
    }

    pub fn add_all(&self) -> SyncResult<()> {
        self.run(["add", "--all"]).map(|_| ())
    }

    /// Commit staged changes with `name <email>` as author and committer.
    pub fn commit_as(&self, message: &str, name: &str, email: &str) -> SyncResult<()> {
        let user_name = format!("user.name={name}");
        let user_email = format!("user.email={email}");
        let author = format!("{name} <{email}>");
        self.run([
            "-c",
            user_name.as_str(),
            "-c",
            user_email.as_str(),
            "commit",
            "--author",
            author.as_str(),
            "-m",
            message,
        ])
        .map(|_| ())
    }

    pub fn push(&self) -> SyncResult<()> {
        self.run(["push"]).map(|_| ())
    }
}
