use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which implementation commits snapshots to git
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsBackend {
    /// In-process, through libgit2
    #[default]
    Libgit2,
    /// Shells out to the `git` executable
    Cli,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Parent directory of the numbered snapshot directories
    pub snapshot_root: PathBuf,
    pub vcs: VcsBackend,
    pub git_binary: String,
    pub command_timeout_secs: u64,
    /// Reject versions whose parents are not existing versions of the same kind
    pub validate_parents: bool,
    pub author_name: String,
    pub author_email: String,
    pub commit_message: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_root: PathBuf::from("./snapshots"),
            vcs: VcsBackend::Libgit2,
            git_binary: "git".to_string(),
            command_timeout_secs: 60,
            validate_parents: true,
            author_name: "ground".to_string(),
            author_email: "ground@localhost".to_string(),
            commit_message: "ground commit".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.snapshot_root = root.into();
        self
    }

    pub fn with_vcs(mut self, vcs: VcsBackend) -> Self {
        self.vcs = vcs;
        self
    }

    pub fn with_git_binary(mut self, binary: impl Into<String>) -> Self {
        self.git_binary = binary.into();
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_parent_validation(mut self, validate: bool) -> Self {
        self.validate_parents = validate;
        self
    }

    pub fn with_author(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.author_name = name.into();
        self.author_email = email.into();
        self
    }

    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.snapshot_root.as_os_str().is_empty() {
            return Err("Snapshot root cannot be empty".to_string());
        }

        if self.git_binary.trim().is_empty() {
            return Err("Git binary cannot be empty".to_string());
        }

        if self.command_timeout_secs == 0 {
            return Err("Command timeout must be greater than 0".to_string());
        }

        if self.author_name.trim().is_empty() || self.author_email.trim().is_empty() {
            return Err("Commit author name and email are required".to_string());
        }

        if self.commit_message.trim().is_empty() {
            return Err("Commit message cannot be empty".to_string());
        }

        Ok(())
    }

    pub fn from_toml_str(content: &str) -> StoreResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| StoreError::InvalidConfig(e.to_string()))?;
        config.validate().map_err(StoreError::InvalidConfig)?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> StoreResult<String> {
        toml::to_string(self).map_err(|e| StoreError::InvalidConfig(e.to_string()))
    }
}
