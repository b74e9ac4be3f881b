//! Version control backends for snapshot directories
//!
//! A snapshot directory is its own git repository. The store only needs four operations from
//! it, captured by [`VersionControl`]:
//!
//! - stage paths relative to the working tree
//! - commit what is staged and return the commit id
//! - find the newest commit that touched a path
//! - list the paths tracked at HEAD
//!
//! [`LibGit2Repository`] does this in-process; [`GitCommand`] shells out to a `git` binary
//! with a timeout. Which one [`open`] returns is chosen by [`StoreConfig::vcs`].
//!
//! ```no_run
//! use ground_store::config::StoreConfig;
//! use ground_store::vcs;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StoreConfig::default();
//! let mut repo = vcs::open(std::path::Path::new("snapshots/0"), &config)?;
//! repo.stage(&["0.json".to_string()])?;
//! let commit = repo.commit("ground commit")?;
//! assert_eq!(repo.latest_commit("0.json")?, Some(commit));
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod libgit2;

pub use command::GitCommand;
pub use libgit2::LibGit2Repository;

use crate::config::{StoreConfig, VcsBackend};
use crate::error::PersistenceResult;
use std::path::Path;

/// Hex id of a commit
pub type CommitId = String;

pub trait VersionControl: Send {
    /// Root of the working tree; every path below is relative to it
    fn workdir(&self) -> &Path;

    fn stage(&mut self, paths: &[String]) -> PersistenceResult<()>;

    fn commit(&mut self, message: &str) -> PersistenceResult<CommitId>;

    /// Newest commit reachable from HEAD whose tree changed `path`
    fn latest_commit(&self, path: &str) -> PersistenceResult<Option<CommitId>>;

    /// Paths tracked at HEAD; empty before the first commit
    fn tracked_paths(&self) -> PersistenceResult<Vec<String>>;
}

/// Open the repository at `workdir`, initializing it (and the directory) when missing
pub fn open(workdir: &Path, config: &StoreConfig) -> PersistenceResult<Box<dyn VersionControl>> {
    std::fs::create_dir_all(workdir)?;
    match config.vcs {
        VcsBackend::Libgit2 => Ok(Box::new(LibGit2Repository::init(
            workdir,
            &config.author_name,
            &config.author_email,
        )?)),
        VcsBackend::Cli => Ok(Box::new(GitCommand::init(workdir, config)?)),
    }
}
