//! Diff hunk type and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a repository known to the code host.
pub type RepositoryId = i64;

/// Errors that can occur while producing or parsing diffs.
#[derive(Debug, Error)]
pub enum DiffError {
    /// I/O error while running the VCS.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The VCS exited unsuccessfully.
    #[error("git exited with {status}: {stderr}")]
    Git { status: String, stderr: String },

    /// No checkout is configured for the repository.
    #[error("no checkout configured for repository {0}")]
    UnknownRepository(RepositoryId),

    /// A `@@` header could not be parsed.
    #[error("malformed hunk header: {0}")]
    MalformedHeader(String),

    /// The diff ended before a hunk supplied all the lines its header announced.
    #[error("truncated hunk: {0}")]
    TruncatedHunk(String),
}

/// One contiguous block of a unified diff.
///
/// Line numbers are one-indexed, as printed in the `@@ -a,b +c,d @@` header.
/// The body keeps each line's `+`, `-` or ` ` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    /// First line of the hunk in the original file.
    pub orig_start: u32,
    /// Number of original-file lines covered by the hunk.
    pub orig_lines: u32,
    /// First line of the hunk in the new file.
    pub new_start: u32,
    /// Number of new-file lines covered by the hunk.
    pub new_lines: u32,
    /// Body lines in diff order.
    pub body: Vec<String>,
}

impl DiffHunk {
    /// Create a hunk from its header values and body lines.
    pub fn new(
        orig_start: u32,
        orig_lines: u32,
        new_start: u32,
        new_lines: u32,
        body: Vec<String>,
    ) -> Self {
        Self {
            orig_start,
            orig_lines,
            new_start,
            new_lines,
            body,
        }
    }

    /// First original-file line touched by the hunk.
    ///
    /// For an empty original span git prints the line *before* the
    /// insertion point, so the span effectively starts one line later.
    pub fn effective_orig_start(&self) -> u32 {
        effective_start(self.orig_start, self.orig_lines)
    }

    /// First new-file line touched by the hunk, with the same convention.
    pub fn effective_new_start(&self) -> u32 {
        effective_start(self.new_start, self.new_lines)
    }

    /// One past the last original-file line covered by the hunk.
    ///
    /// Saturates for hunks built by hand; [`crate::parse_hunks`] rejects
    /// headers whose span does not fit.
    pub fn orig_end(&self) -> u32 {
        self.effective_orig_start().saturating_add(self.orig_lines)
    }

    /// One past the last new-file line covered by the hunk.
    pub fn new_end(&self) -> u32 {
        self.effective_new_start().saturating_add(self.new_lines)
    }
}

fn effective_start(start: u32, lines: u32) -> u32 {
    if lines == 0 {
        start.saturating_add(1)
    } else {
        start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_bounds() {
        let hunk = DiffHunk::new(10, 3, 10, 2, vec![]);
        assert_eq!(hunk.effective_orig_start(), 10);
        assert_eq!(hunk.orig_end(), 13);
        assert_eq!(hunk.new_end(), 12);
    }

    #[test]
    fn test_empty_spans_start_after_anchor() {
        // Pure insertion of two lines after original line 5.
        let insertion = DiffHunk::new(5, 0, 6, 2, vec![]);
        assert_eq!(insertion.effective_orig_start(), 6);
        assert_eq!(insertion.orig_end(), 6);
        assert_eq!(insertion.new_end(), 8);

        // Pure deletion of lines 10-11.
        let deletion = DiffHunk::new(10, 2, 9, 0, vec![]);
        assert_eq!(deletion.effective_new_start(), 10);
        assert_eq!(deletion.new_end(), 10);
    }

    #[test]
    fn test_span_bounds_saturate() {
        let hunk = DiffHunk::new(u32::MAX, 0, u32::MAX - 1, 5, vec![]);
        assert_eq!(hunk.effective_orig_start(), u32::MAX);
        assert_eq!(hunk.orig_end(), u32::MAX);
        assert_eq!(hunk.new_end(), u32::MAX);
    }
}
