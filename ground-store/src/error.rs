use ground_model::{Id, Kind, ModelError};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the versioning engine and the client façade
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown {kind} item id: {id}")]
    UnknownItem { kind: Kind, id: Id },

    #[error("Parent {parent} is not an existing {kind} version")]
    MalformedParent { kind: Kind, parent: Id },

    #[error("{kind} versions cannot carry {field}")]
    UnsupportedField { kind: Kind, field: &'static str },

    #[error("Id already registered: {0}")]
    DuplicateId(Id),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Backend not supported: {0}. Please choose 'git' or 'ground'")]
    UnsupportedBackend(String),

    #[error("Backend '{0}' is not available in this build")]
    BackendUnavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures while writing or reading snapshots
///
/// A failed commit is not rolled back: artifacts may already be on disk, or staged, without a
/// matching commit.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Command failed: {command}: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Command timed out after {}s: {command}", .timeout.as_secs())]
    CommandTimeout { command: String, timeout: Duration },

    #[error("No snapshot directories under {}", .0.display())]
    NoSnapshots(PathBuf),

    #[error("Invalid manifest line {line}: {content:?}")]
    InvalidManifest { line: usize, content: String },

    #[error("Invalid artifact {}: {source}", .path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("No commit touches tracked path {0}")]
    Untracked(String),

    #[error("Invalid artifact pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Artifact scan failed: {0}")]
    Scan(#[from] glob::GlobError),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
