//! Diff hunk handling for commit-aware code navigation.
//!
//! Index data is produced against one commit of a repository but queried at
//! another. This crate provides the pieces that translate coordinates between
//! the two:
//!
//! - `DiffHunk`: one `@@ -a,b +c,d @@` block of a unified diff
//! - `parse_hunks`: turns `git diff` output for a single file into hunks
//! - `adjust_position` / `adjust_range`: map a zero-indexed coordinate from
//!   the original side of a diff onto the new side
//! - `DiffSource`: the capability that produces hunks between two commits,
//!   with a `git`-backed implementation
//!
//! # Example
//!
//! ```
//! use codenav_diff::{adjust_position, parse_hunks, Position};
//!
//! let diff = "@@ -10,3 +10,2 @@\n l10\n l11\n-l12\n";
//! let hunks = parse_hunks(diff).unwrap();
//!
//! // Lines below the hunk shift up by one.
//! assert_eq!(adjust_position(&hunks, Position::new(20, 4)), Some(Position::new(19, 4)));
//!
//! // The deleted line has no counterpart.
//! assert_eq!(adjust_position(&hunks, Position::new(11, 0)), None);
//! ```
//!
//! # Line Number Convention
//!
//! Positions are zero-indexed, as in LSP. Hunk headers are one-indexed, as
//! printed by git; the conversion happens inside the adjuster.

pub mod adjust;
pub mod parse;
pub mod source;
pub mod types;

pub use adjust::{adjust_position, adjust_range};
pub use parse::parse_hunks;
pub use source::{DiffSource, GitDiffSource};
pub use types::{DiffError, DiffHunk, RepositoryId};

// Coordinates are plain LSP positions and ranges.
pub use lsp_types::{Position, Range};
