//! Snapshot directories, artifacts and the commit manifest
//!
//! Snapshots live in numerically named directories under one root (`0`, `1`, ...). Each is a
//! git repository holding one `<id>.json` artifact per item or version. After the artifacts
//! are committed, a `.manifest` file is written listing every tracked path with the last
//! commit that touched it, and committed on its own.

use crate::error::{PersistenceError, PersistenceResult, StoreResult};
use crate::graph::GraphStore;
use crate::vcs::{CommitId, VersionControl};
use chrono::{DateTime, Utc};
use ground_model::{Id, Record};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const MANIFEST_FILE: &str = ".manifest";
pub const ARTIFACT_EXTENSION: &str = "json";

pub fn artifact_name(id: Id) -> String {
    format!("{}.{}", id, ARTIFACT_EXTENSION)
}

/// The numbered snapshot directories under a root
#[derive(Debug, Clone)]
pub struct SnapshotLayout {
    root: PathBuf,
}

impl SnapshotLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Existing slot numbers, ascending; a missing root has none
    pub fn slots(&self) -> PersistenceResult<Vec<u64>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut slots = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(slot) = entry.file_name().to_str().and_then(|n| n.parse().ok()) {
                slots.push(slot);
            }
        }
        slots.sort_unstable();
        Ok(slots)
    }

    /// One past the highest existing slot
    pub fn next_free_slot(&self) -> PersistenceResult<u64> {
        Ok(self.latest_slot()?.map_or(0, |slot| slot + 1))
    }

    pub fn latest_slot(&self) -> PersistenceResult<Option<u64>> {
        Ok(self.slots()?.last().copied())
    }

    /// Highest existing slot below `slot`
    pub fn slot_before(&self, slot: u64) -> PersistenceResult<Option<u64>> {
        Ok(self.slots()?.into_iter().filter(|s| *s < slot).last())
    }

    pub fn slot_dir(&self, slot: u64) -> PathBuf {
        self.root.join(slot.to_string())
    }
}

/// Tracked path to the last commit that touched it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    entries: BTreeMap<String, CommitId>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, commit: impl Into<CommitId>) {
        self.entries.insert(path.into(), commit.into());
    }

    pub fn get(&self, path: &str) -> Option<&CommitId> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    /// One `<path> <commit>` line per entry
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(path, commit)| format!("{} {}\n", path, commit))
            .collect()
    }

    pub fn parse(content: &str) -> PersistenceResult<Self> {
        let mut manifest = Self::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match line.rsplit_once(' ') {
                Some((path, commit)) if !path.is_empty() && !commit.is_empty() => {
                    manifest.insert(path, commit)
                }
                _ => {
                    return Err(PersistenceError::InvalidManifest {
                        line: number + 1,
                        content: line.to_string(),
                    })
                }
            }
        }
        Ok(manifest)
    }

    /// Build from what `vcs` tracks at HEAD, leaving out the manifest itself
    pub fn from_history(vcs: &dyn VersionControl) -> PersistenceResult<Self> {
        let mut manifest = Self::new();
        for path in vcs.tracked_paths()? {
            if path == MANIFEST_FILE {
                continue;
            }
            let commit = vcs
                .latest_commit(&path)?
                .ok_or_else(|| PersistenceError::Untracked(path.clone()))?;
            manifest.insert(path, commit);
        }
        Ok(manifest)
    }
}

/// Read the manifest committed in snapshot directory `dir`
pub fn read_manifest(dir: &Path) -> PersistenceResult<Manifest> {
    Manifest::parse(&fs::read_to_string(dir.join(MANIFEST_FILE))?)
}

/// Outcome of one commit
#[derive(Debug, Clone, Serialize)]
pub struct CommitReport {
    pub slot: u64,
    pub directory: PathBuf,
    /// Number of artifacts written
    pub artifacts: usize,
    pub data_commit: CommitId,
    pub manifest_commit: CommitId,
    pub manifest_entries: usize,
    pub committed_at: DateTime<Utc>,
}

/// Write every object in `store` to the working tree of `vcs`, then commit it and its manifest
///
/// Nothing is rolled back on failure.
pub fn commit_store(
    store: &GraphStore,
    vcs: &mut dyn VersionControl,
    slot: u64,
    message: &str,
) -> StoreResult<CommitReport> {
    let directory = vcs.workdir().to_path_buf();
    fs::create_dir_all(&directory).map_err(PersistenceError::from)?;

    let mut written = Vec::with_capacity(store.len());
    for record in store.records() {
        let name = artifact_name(record.id());
        fs::write(directory.join(&name), record.to_json()?).map_err(PersistenceError::from)?;
        written.push(name);
    }
    debug!("Wrote {} artifacts to {}", written.len(), directory.display());

    vcs.stage(&written)?;
    let data_commit = vcs.commit(message)?;

    let manifest = Manifest::from_history(vcs)?;
    fs::write(directory.join(MANIFEST_FILE), manifest.render()).map_err(PersistenceError::from)?;
    vcs.stage(&[MANIFEST_FILE.to_string()])?;
    let manifest_commit = vcs.commit(&format!("{} commit", MANIFEST_FILE))?;

    info!(
        "Committed {} artifacts to {} ({})",
        written.len(),
        directory.display(),
        data_commit
    );

    Ok(CommitReport {
        slot,
        directory,
        artifacts: written.len(),
        data_commit,
        manifest_commit,
        manifest_entries: manifest.len(),
        committed_at: Utc::now(),
    })
}

/// Decode every artifact in `dir`, ascending by id
pub fn read_artifacts(dir: &Path) -> PersistenceResult<Vec<Record>> {
    let pattern = format!(
        "{}/*.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        ARTIFACT_EXTENSION
    );

    let mut records = Vec::new();
    for path in glob::glob(&pattern)? {
        let path = path?;
        let json = fs::read_to_string(&path)?;
        let record =
            Record::from_json(&json).map_err(|source| PersistenceError::Artifact { path, source })?;
        records.push(record);
    }

    records.sort_by_key(Record::id);
    Ok(records)
}

/// Restore the artifacts of `dir` into `store`, returning how many were read
///
/// The store is left unchanged when any artifact is rejected.
pub fn load_into(store: &mut GraphStore, dir: &Path) -> StoreResult<usize> {
    let count = store.restore_all(read_artifacts(dir)?)?;

    info!("Loaded {} records from {}", count, dir.display());
    Ok(count)
}
