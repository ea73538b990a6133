//! Data model shared by the query resolver, the backends and the transport.

use codenav_diff::{Position, Range, RepositoryId};
use serde::{Deserialize, Serialize};

/// Identifier of one upload.
pub type UploadId = i64;

/// One immutable precomputed index of a repository at a commit and root.
///
/// Candidate uploads for a query arrive already ranked by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upload {
    pub id: UploadId,
    pub repository_id: RepositoryId,
    pub commit: String,
    /// Directory of the repository the index was generated for.
    #[serde(default)]
    pub root: String,
    /// Name of the tool that produced the index.
    #[serde(default)]
    pub indexer: String,
}

/// A location read from the index of `dump`, in `dump.commit` coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub dump: Upload,
    pub path: String,
    pub range: Range,
}

/// A diagnostic as stored in an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub path: String,
    /// LSP severity: 1 error, 2 warning, 3 information, 4 hint.
    pub severity: i32,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub source: String,
    pub start_line: u32,
    pub start_character: u32,
    pub end_line: u32,
    pub end_character: u32,
}

impl Diagnostic {
    /// The diagnostic's span as a range.
    pub fn range(&self) -> Range {
        Range::new(
            Position::new(self.start_line, self.start_character),
            Position::new(self.end_line, self.end_character),
        )
    }
}

/// A diagnostic together with the upload it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDiagnostic {
    pub dump: Upload,
    pub diagnostic: Diagnostic,
}

/// A result location rewritten into the requested commit when possible.
///
/// When adjustment is impossible `adjusted_commit` is the upload's own commit
/// and `adjusted_range` the range as indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjustedLocation {
    pub dump: Upload,
    pub path: String,
    pub adjusted_commit: String,
    pub adjusted_range: Range,
}

/// A diagnostic rewritten into the requested commit when possible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjustedDiagnostic {
    pub diagnostic: ResolvedDiagnostic,
    pub adjusted_commit: String,
    pub adjusted_range: Range,
}

/// Hover text and the span it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hover {
    pub text: String,
    pub range: Range,
}

/// Identifies one page of references within a single upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencesRequest {
    pub upload_id: UploadId,
    pub path: String,
    /// Position in the upload's coordinates.
    pub position: Position,
    /// Continuation token from the previous page; `None` for the first page.
    pub token: Option<String>,
}

/// One page of references from a single upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferencesPage {
    pub locations: Vec<Location>,
    /// Token for the next page, `None` once the upload is exhausted.
    pub next: Option<String>,
}

/// One page of diagnostics from a single upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticsPage {
    pub diagnostics: Vec<ResolvedDiagnostic>,
    /// Number of diagnostics available in the upload, ignoring paging.
    pub total_count: usize,
}

/// Filters for listing uploads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadsQuery {
    /// Restrict to one repository.
    pub repository_id: Option<RepositoryId>,
    /// Lower-cased processing state, e.g. `completed`.
    pub state: Option<String>,
    /// Free-text search term.
    pub term: Option<String>,
    /// Only uploads visible from the tip of the default branch.
    pub visible_at_tip: bool,
    pub limit: usize,
    pub offset: usize,
}

/// One page of an upload listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadsPage {
    pub uploads: Vec<Upload>,
    pub total_count: usize,
    /// Offset cursor of the next page; `None` after the last page.
    pub end_cursor: Option<String>,
}

/// A repository as known to the repository store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepositoryId,
    pub name: String,
}

/// A revision resolved within a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub repository: Repository,
    /// Full object id.
    pub oid: String,
    /// The revision as requested.
    pub rev: String,
}

/// A file within a resolved commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub commit: Commit,
    pub path: String,
}
