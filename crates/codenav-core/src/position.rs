//! Commit-to-commit position adjustment for one repository.

use std::sync::Arc;

use codenav_diff::{adjust_position, adjust_range, DiffError, DiffHunk, DiffSource};
use codenav_diff::{Position, Range, RepositoryId};
use tracing::trace;

/// Moves positions between the requested commit and an upload's commit.
///
/// With `reverse == false` positions go from the requested commit into
/// `commit`; with `reverse == true` they come back from `commit` into the
/// requested commit.
#[derive(Clone)]
pub struct PositionAdjuster {
    diff_source: Arc<dyn DiffSource>,
    repository_id: RepositoryId,
    requested_commit: String,
}

impl PositionAdjuster {
    pub fn new(
        diff_source: Arc<dyn DiffSource>,
        repository_id: RepositoryId,
        requested_commit: impl Into<String>,
    ) -> Self {
        Self {
            diff_source,
            repository_id,
            requested_commit: requested_commit.into(),
        }
    }

    /// Adjust a position of `path`. `None` means no equivalent position.
    pub async fn adjust_position(
        &self,
        commit: &str,
        path: &str,
        position: Position,
        reverse: bool,
    ) -> Result<Option<Position>, DiffError> {
        let hunks = self.hunks(commit, path, reverse).await?;
        Ok(adjust_position(&hunks, position))
    }

    /// Adjust a range of `path`. `None` unless both endpoints adjust.
    pub async fn adjust_range(
        &self,
        commit: &str,
        path: &str,
        range: Range,
        reverse: bool,
    ) -> Result<Option<Range>, DiffError> {
        let hunks = self.hunks(commit, path, reverse).await?;
        Ok(adjust_range(&hunks, range))
    }

    async fn hunks(
        &self,
        commit: &str,
        path: &str,
        reverse: bool,
    ) -> Result<Vec<DiffHunk>, DiffError> {
        let (source, target) = if reverse {
            (commit, self.requested_commit.as_str())
        } else {
            (self.requested_commit.as_str(), commit)
        };

        let hunks = self
            .diff_source
            .diff(self.repository_id, source, target, path)
            .await?;
        trace!(source, target, path, hunks = hunks.len(), "Fetched diff hunks");
        Ok(hunks)
    }
}
