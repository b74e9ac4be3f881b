//! In-process git through libgit2

use super::{CommitId, VersionControl};
use crate::error::PersistenceResult;
use git2::{
    Commit, ErrorCode, ObjectType, Oid, Repository, Signature, Sort, Tree, TreeWalkMode,
    TreeWalkResult,
};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct LibGit2Repository {
    repo: Repository,
    workdir: PathBuf,
    author_name: String,
    author_email: String,
}

impl LibGit2Repository {
    /// Open the repository at `workdir`, or create one there
    pub fn init(workdir: &Path, author_name: &str, author_email: &str) -> PersistenceResult<Self> {
        let repo = match Repository::open(workdir) {
            Ok(repo) => repo,
            Err(_) => {
                debug!("Initializing git repository at {}", workdir.display());
                Repository::init(workdir)?
            }
        };

        Ok(Self {
            repo,
            workdir: workdir.to_path_buf(),
            author_name: author_name.to_string(),
            author_email: author_email.to_string(),
        })
    }

    fn head_commit(&self) -> PersistenceResult<Option<Commit<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn entry_id(tree: &Tree<'_>, path: &str) -> Option<Oid> {
    tree.get_path(Path::new(path)).ok().map(|entry| entry.id())
}

impl VersionControl for LibGit2Repository {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn stage(&mut self, paths: &[String]) -> PersistenceResult<()> {
        let mut index = self.repo.index()?;
        for path in paths {
            index.add_path(Path::new(path))?;
        }
        index.write()?;
        Ok(())
    }

    fn commit(&mut self, message: &str) -> PersistenceResult<CommitId> {
        let mut index = self.repo.index()?;
        let tree = self.repo.find_tree(index.write_tree()?)?;
        let signature = Signature::now(&self.author_name, &self.author_email)?;
        let parent = self.head_commit()?;
        let parents: Vec<&Commit<'_>> = parent.iter().collect();

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;

        debug!("Committed {} in {}", oid, self.workdir.display());
        Ok(oid.to_string())
    }

    fn latest_commit(&self, path: &str) -> PersistenceResult<Option<CommitId>> {
        let Some(head) = self.head_commit()? else {
            return Ok(None);
        };

        let mut walk = self.repo.revwalk()?;
        walk.push(head.id())?;
        walk.set_sorting(Sort::TOPOLOGICAL)?;

        for oid in walk {
            let commit = self.repo.find_commit(oid?)?;
            let current = entry_id(&commit.tree()?, path);
            let previous = match commit.parents().next() {
                Some(parent) => entry_id(&parent.tree()?, path),
                None => None,
            };

            if current != previous {
                return Ok(Some(commit.id().to_string()));
            }
        }

        Ok(None)
    }

    fn tracked_paths(&self) -> PersistenceResult<Vec<String>> {
        let Some(head) = self.head_commit()? else {
            return Ok(Vec::new());
        };

        let mut paths = Vec::new();
        head.tree()?.walk(TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(ObjectType::Blob) {
                if let Some(name) = entry.name() {
                    paths.push(format!("{}{}", root, name));
                }
            }
            TreeWalkResult::Ok
        })?;

        Ok(paths)
    }
}
