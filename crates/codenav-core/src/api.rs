//! Backends consumed by the query engine.
//!
//! None of these are implemented here: the index store, the upload catalog
//! and the repository service live elsewhere. Errors are opaque and are
//! propagated unchanged as [`QueryError::Upstream`](crate::QueryError).

use async_trait::async_trait;
use codenav_diff::{Position, RepositoryId};

use crate::types::{
    Commit, DiagnosticsPage, Hover, Location, ReferencesPage, ReferencesRequest, Repository,
    TreeEntry, Upload, UploadId, UploadsQuery,
};

/// Answers queries against precomputed indexes.
///
/// Positions passed in are already in the coordinates of the upload being
/// queried.
#[async_trait]
pub trait NavigationApi: Send + Sync {
    /// Definitions of the symbol at `position` of `path` in one upload.
    async fn definitions(
        &self,
        path: &str,
        position: Position,
        upload_id: UploadId,
    ) -> anyhow::Result<Vec<Location>>;

    /// One page of references, which may span uploads of other repositories.
    async fn references(
        &self,
        repository_id: RepositoryId,
        commit: &str,
        limit: usize,
        request: &ReferencesRequest,
    ) -> anyhow::Result<ReferencesPage>;

    /// Hover text at `position`, or `None` if the upload has none.
    async fn hover(
        &self,
        path: &str,
        position: Position,
        upload_id: UploadId,
    ) -> anyhow::Result<Option<Hover>>;

    /// Up to `limit` diagnostics for `path` (a file or directory prefix).
    async fn diagnostics(
        &self,
        path: &str,
        upload_id: UploadId,
        limit: usize,
        offset: usize,
    ) -> anyhow::Result<DiagnosticsPage>;

    /// Uploads able to answer queries about `path` at `commit`, best first.
    async fn find_closest_dumps(
        &self,
        repository_id: RepositoryId,
        commit: &str,
        path: &str,
        exact_path: bool,
        indexer: Option<&str>,
    ) -> anyhow::Result<Vec<Upload>>;
}

/// The upload catalog.
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// A single upload, or `None` if it does not exist.
    async fn upload_by_id(&self, id: UploadId) -> anyhow::Result<Option<Upload>>;

    /// Uploads matching `query`, and the total number of matches ignoring
    /// limit and offset.
    async fn uploads(&self, query: &UploadsQuery) -> anyhow::Result<(Vec<Upload>, usize)>;
}

/// Resolves repositories, revisions and files into presentation entities.
#[async_trait]
pub trait RepositoryStore: Send + Sync {
    /// Look up a repository by id.
    async fn repository(&self, id: RepositoryId) -> anyhow::Result<Repository>;

    /// Resolve `rev` within `repository`. A revision that does not exist is
    /// `Ok(None)`, not an error.
    async fn resolve_revision(
        &self,
        repository: &Repository,
        rev: &str,
    ) -> anyhow::Result<Option<Commit>>;

    /// The file `path` within `commit`.
    async fn tree_entry(&self, commit: &Commit, path: &str) -> anyhow::Result<TreeEntry>;
}
