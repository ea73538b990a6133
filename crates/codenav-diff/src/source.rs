//! Sources of diff hunks between two commits.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::parse::parse_hunks;
use crate::types::{DiffError, DiffHunk, RepositoryId};

/// Supplies the hunks of a single file between two commits.
///
/// Implementations return an empty list when the commits are identical or the
/// file did not change. Errors are reserved for transport or VCS failures.
#[async_trait]
pub trait DiffSource: Send + Sync {
    /// Diff `path` from `source_commit` to `target_commit`.
    async fn diff(
        &self,
        repository_id: RepositoryId,
        source_commit: &str,
        target_commit: &str,
        path: &str,
    ) -> Result<Vec<DiffHunk>, DiffError>;
}

/// Runs `git diff` in a local checkout of each repository.
#[derive(Debug, Clone)]
pub struct GitDiffSource {
    /// Git executable.
    git_binary: String,
    /// Checkout directory per repository.
    repositories: HashMap<RepositoryId, PathBuf>,
}

impl Default for GitDiffSource {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitDiffSource {
    /// Create a source that invokes the given git executable.
    pub fn new(git_binary: impl Into<String>) -> Self {
        Self {
            git_binary: git_binary.into(),
            repositories: HashMap::new(),
        }
    }

    /// Register the checkout directory of a repository.
    pub fn with_repository(mut self, id: RepositoryId, dir: impl Into<PathBuf>) -> Self {
        self.repositories.insert(id, dir.into());
        self
    }

    /// Checkout directory of a repository, if registered.
    pub fn repository_dir(&self, id: RepositoryId) -> Option<&Path> {
        self.repositories.get(&id).map(PathBuf::as_path)
    }
}

#[async_trait]
impl DiffSource for GitDiffSource {
    async fn diff(
        &self,
        repository_id: RepositoryId,
        source_commit: &str,
        target_commit: &str,
        path: &str,
    ) -> Result<Vec<DiffHunk>, DiffError> {
        if source_commit == target_commit {
            return Ok(Vec::new());
        }

        let dir = self
            .repository_dir(repository_id)
            .ok_or(DiffError::UnknownRepository(repository_id))?;

        debug!(
            repository_id = repository_id,
            source = source_commit,
            target = target_commit,
            path = path,
            "Running git diff"
        );

        let output = Command::new(&self.git_binary)
            .arg("-C")
            .arg(dir)
            .args(["diff", "--no-color", "--no-ext-diff", source_commit, target_commit, "--", path])
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(
                repository_id = repository_id,
                status = %output.status,
                stderr = %stderr,
                "git diff failed"
            );
            return Err(DiffError::Git {
                status: output.status.to_string(),
                stderr,
            });
        }

        parse_hunks(&String::from_utf8_lossy(&output.stdout))
    }
}
