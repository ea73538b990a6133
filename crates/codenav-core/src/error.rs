//! Error types for navigation queries.

use codenav_diff::DiffError;
use thiserror::Error;

/// Errors that can occur while answering a navigation query.
///
/// A position that cannot be adjusted between commits is not an error; it
/// surfaces as `None` and the affected upload is skipped or its result is
/// kept at its original location.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The caller asked for fewer than one result per page.
    #[error("illegal limit")]
    IllegalLimit,

    /// A pagination cursor could not be decoded.
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    /// A diagnostic carried a severity outside 1..=4.
    #[error("unknown diagnostic severity {0}")]
    UnknownSeverity(i32),

    /// The operation was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// Diff retrieval failed.
    #[error(transparent)]
    Diff(#[from] DiffError),

    /// A navigation, upload or repository backend failed.
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}
