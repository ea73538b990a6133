//! Top-level entry point: builds query resolvers and lists uploads.

use std::sync::Arc;

use codenav_diff::{DiffSource, RepositoryId};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{NavigationApi, UploadStore};
use crate::cursor::{encode_offset_cursor, next_offset};
use crate::error::QueryError;
use crate::query::{cancellable, QueryResolver};
use crate::types::{Upload, UploadId, UploadsPage, UploadsQuery};

/// Default page size for upload listings.
pub const DEFAULT_UPLOADS_PAGE_SIZE: usize = 50;

/// Owns the backends and hands out per-file [`QueryResolver`]s.
#[derive(Clone)]
pub struct Resolver {
    api: Arc<dyn NavigationApi>,
    diff_source: Arc<dyn DiffSource>,
    uploads: Arc<dyn UploadStore>,
    cancellation: CancellationToken,
}

impl Resolver {
    pub fn new(
        api: Arc<dyn NavigationApi>,
        diff_source: Arc<dyn DiffSource>,
        uploads: Arc<dyn UploadStore>,
    ) -> Self {
        Self {
            api,
            diff_source,
            uploads,
            cancellation: CancellationToken::new(),
        }
    }

    /// Cancelling `token` cancels every query resolver created afterwards.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// A resolver for `path` at `commit`, or `None` if no upload can answer
    /// queries about it.
    pub async fn query_resolver(
        &self,
        repository_id: RepositoryId,
        commit: &str,
        path: &str,
        exact_path: bool,
        indexer: Option<&str>,
    ) -> Result<Option<QueryResolver>, QueryError> {
        let dumps = cancellable(
            &self.cancellation,
            self.api
                .find_closest_dumps(repository_id, commit, path, exact_path, indexer),
        )
        .await?;

        if dumps.is_empty() {
            debug!(repository_id, commit, path, "No uploads cover this path");
            return Ok(None);
        }

        debug!(
            repository_id,
            commit,
            path,
            uploads = dumps.len(),
            "Found candidate uploads"
        );

        Ok(Some(
            QueryResolver::new(
                Arc::clone(&self.api),
                Arc::clone(&self.diff_source),
                repository_id,
                commit,
                path,
                dumps,
            )
            .with_cancellation(self.cancellation.child_token()),
        ))
    }

    /// A single upload, or `None` if it does not exist.
    pub async fn upload_by_id(&self, id: UploadId) -> Result<Option<Upload>, QueryError> {
        cancellable(&self.cancellation, self.uploads.upload_by_id(id)).await
    }

    /// One page of uploads matching `query`.
    pub async fn uploads(&self, query: &UploadsQuery) -> Result<UploadsPage, QueryError> {
        if query.limit == 0 {
            return Err(QueryError::IllegalLimit);
        }

        let (uploads, total_count) =
            cancellable(&self.cancellation, self.uploads.uploads(query)).await?;
        let end_cursor =
            next_offset(query.offset, uploads.len(), total_count).map(encode_offset_cursor);
        Ok(UploadsPage {
            uploads,
            total_count,
            end_cursor,
        })
    }
}
