//! Commit-aware code navigation over precomputed indexes.
//!
//! Given a position in a file at some commit, answers definitions,
//! references, hover and diagnostics queries from indexes ("uploads") that
//! may have been generated at other commits of the same repository.
//! Positions are moved between commits using the diff between them.
//!
//! The main entry points are:
//! - [`Resolver`]: finds the candidate uploads for a file and builds a
//!   [`QueryResolver`] over them
//! - [`QueryResolver`]: runs the queries and adjusts positions both ways
//! - [`QueryConnection`]: applies paging defaults and resolves results into
//!   presentation nodes through a [`CachedLocationResolver`]

pub mod api;
pub mod cursor;
pub mod error;
pub mod location;
pub mod position;
pub mod query;
pub mod resolver;
pub mod transport;
pub mod types;

pub use api::{NavigationApi, RepositoryStore, UploadStore};
pub use cursor::{
    decode_cursor, decode_offset_cursor, encode_cursor, encode_offset_cursor, next_offset, Cursor,
};
pub use error::QueryError;
pub use location::{CachedLocationResolver, LocationNode, Memo};
pub use position::PositionAdjuster;
pub use query::QueryResolver;
pub use resolver::{Resolver, DEFAULT_UPLOADS_PAGE_SIZE};
pub use transport::{
    DiagnosticConnection, DiagnosticNode, HoverNode, LocationConnection, PagedPositionArgs,
    PositionArgs, QueryConnection, Severity, DEFAULT_DIAGNOSTICS_PAGE_SIZE,
    DEFAULT_REFERENCES_PAGE_SIZE,
};
pub use types::*;
