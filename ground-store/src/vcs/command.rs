//! Git through the command line
//!
//! Every invocation runs under a deadline. A command still running when it expires is killed
//! and reported as [`PersistenceError::CommandTimeout`].

use super::{CommitId, VersionControl};
use crate::config::StoreConfig;
use crate::error::{PersistenceError, PersistenceResult};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct GitCommand {
    workdir: PathBuf,
    binary: String,
    timeout: Duration,
    author_name: String,
    author_email: String,
}

impl GitCommand {
    /// Bind to `workdir`, running `git init` there if it is not a repository yet
    pub fn init(workdir: &Path, config: &StoreConfig) -> PersistenceResult<Self> {
        let git = Self {
            workdir: workdir.to_path_buf(),
            binary: config.git_binary.clone(),
            timeout: config.command_timeout(),
            author_name: config.author_name.clone(),
            author_email: config.author_email.clone(),
        };

        if !workdir.join(".git").exists() {
            git.run(&["init", "--quiet"])?;
        }
        Ok(git)
    }

    /// Run git with `args` in the working tree and return its stdout
    fn run(&self, args: &[&str]) -> PersistenceResult<String> {
        let command = format!("{} {}", self.binary, args.join(" "));
        debug!("Running {}", command);

        let mut child = Command::new(&self.binary)
            .args(args)
            .current_dir(&self.workdir)
            .env("GIT_AUTHOR_NAME", &self.author_name)
            .env("GIT_AUTHOR_EMAIL", &self.author_email)
            .env("GIT_COMMITTER_NAME", &self.author_name)
            .env("GIT_COMMITTER_EMAIL", &self.author_email)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain both pipes while waiting so a chatty command cannot block on a full pipe.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                warn!("Killing {} after {:?}", command, self.timeout);
                let _ = child.kill();
                let _ = child.wait();
                return Err(PersistenceError::CommandTimeout {
                    command,
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = stdout
            .map(|reader| reader.join().unwrap_or_default())
            .unwrap_or_default();
        let stderr = stderr
            .map(|reader| reader.join().unwrap_or_default())
            .unwrap_or_default();

        if !status.success() {
            return Err(PersistenceError::CommandFailed {
                command,
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(stdout)
    }

    fn has_head(&self) -> PersistenceResult<bool> {
        match self.run(&["rev-parse", "--verify", "--quiet", "HEAD"]) {
            Ok(_) => Ok(true),
            Err(PersistenceError::CommandFailed { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn drain(mut pipe: impl Read + Send + 'static) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = pipe.read_to_end(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    })
}

impl VersionControl for GitCommand {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn stage(&mut self, paths: &[String]) -> PersistenceResult<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut args = vec!["add", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run(&args)?;
        Ok(())
    }

    fn commit(&mut self, message: &str) -> PersistenceResult<CommitId> {
        self.run(&["commit", "--quiet", "--allow-empty", "-m", message])?;
        Ok(self.run(&["rev-parse", "HEAD"])?.trim().to_string())
    }

    fn latest_commit(&self, path: &str) -> PersistenceResult<Option<CommitId>> {
        if !self.has_head()? {
            return Ok(None);
        }
        let output = self.run(&["log", "-n", "1", "--format=%H", "--", path])?;
        let commit = output.trim();
        Ok((!commit.is_empty()).then(|| commit.to_string()))
    }

    fn tracked_paths(&self) -> PersistenceResult<Vec<String>> {
        if !self.has_head()? {
            return Ok(Vec::new());
        }
        let output = self.run(&["ls-tree", "-r", "--name-only", "HEAD"])?;
        Ok(output
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
