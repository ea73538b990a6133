//! Navigation queries across the ranked uploads of one file.
//!
//! Every query position is expressed in the requested commit. For each
//! candidate upload the position is first moved into the upload's commit; if
//! the line was edited in between the upload cannot answer and is skipped.
//! Results are moved back into the requested commit, falling back to their
//! indexed location when that is not possible.

use std::future::Future;
use std::sync::Arc;

use codenav_diff::{DiffSource, Position, Range, RepositoryId};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::api::NavigationApi;
use crate::cursor::{encode_cursor, Cursor};
use crate::error::QueryError;
use crate::position::PositionAdjuster;
use crate::types::{
    AdjustedDiagnostic, AdjustedLocation, Hover, Location, ReferencesRequest, Upload,
};

/// Answers navigation queries for one path at one commit.
pub struct QueryResolver {
    api: Arc<dyn NavigationApi>,
    adjuster: PositionAdjuster,
    repository_id: RepositoryId,
    commit: String,
    path: String,
    uploads: Vec<Upload>,
    cancellation: CancellationToken,
}

impl QueryResolver {
    /// Create a resolver over `uploads`, which must be ranked best first.
    pub fn new(
        api: Arc<dyn NavigationApi>,
        diff_source: Arc<dyn DiffSource>,
        repository_id: RepositoryId,
        commit: impl Into<String>,
        path: impl Into<String>,
        uploads: Vec<Upload>,
    ) -> Self {
        let commit = commit.into();
        Self {
            api,
            adjuster: PositionAdjuster::new(diff_source, repository_id, commit.clone()),
            repository_id,
            commit,
            path: path.into(),
            uploads,
            cancellation: CancellationToken::new(),
        }
    }

    /// Abort in-flight and future operations when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn repository_id(&self) -> RepositoryId {
        self.repository_id
    }

    pub fn commit(&self) -> &str {
        &self.commit
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn uploads(&self) -> &[Upload] {
        &self.uploads
    }

    /// Definitions from the first upload that has any.
    pub async fn definitions(
        &self,
        line: u32,
        character: u32,
    ) -> Result<Vec<AdjustedLocation>, QueryError> {
        let position = Position::new(line, character);

        for upload in &self.uploads {
            let Some(adjusted) = self.adjust_query_position(upload, position).await? else {
                continue;
            };

            let locations = self
                .guard(self.api.definitions(&self.path, adjusted, upload.id))
                .await?;
            if locations.is_empty() {
                trace!(upload_id = upload.id, "No definitions in upload");
                continue;
            }

            debug!(
                upload_id = upload.id,
                count = locations.len(),
                "Found definitions"
            );
            return self.adjust_locations(locations).await;
        }

        Ok(Vec::new())
    }

    /// One page of references, merged across uploads in rank order.
    ///
    /// An empty `cursor` starts from the first page of every upload; a
    /// non-empty one continues only the uploads it names. The returned cursor
    /// is empty once every upload is exhausted.
    pub async fn references(
        &self,
        line: u32,
        character: u32,
        limit: i32,
        cursor: &Cursor,
    ) -> Result<(Vec<AdjustedLocation>, String), QueryError> {
        if limit <= 0 {
            return Err(QueryError::IllegalLimit);
        }
        let limit = limit as usize;
        let position = Position::new(line, character);

        let mut next_cursor = Cursor::new();
        let mut locations = Vec::new();

        for upload in &self.uploads {
            let token = match cursor.get(&upload.id) {
                Some(token) => Some(token.clone()),
                // Exhausted on an earlier page, or not part of this sequence.
                None if !cursor.is_empty() => continue,
                None => None,
            };

            let Some(adjusted) = self.adjust_query_position(upload, position).await? else {
                continue;
            };

            let request = ReferencesRequest {
                upload_id: upload.id,
                path: self.path.clone(),
                position: adjusted,
                token,
            };
            let page = self
                .guard(
                    self.api
                        .references(self.repository_id, &self.commit, limit, &request),
                )
                .await?;

            trace!(
                upload_id = upload.id,
                count = page.locations.len(),
                has_next = page.next.is_some(),
                "Fetched references page"
            );

            if let Some(next) = page.next.filter(|next| !next.is_empty()) {
                next_cursor.insert(upload.id, next);
            }
            locations.extend(page.locations);
        }

        let end_cursor = encode_cursor(&next_cursor)?;
        let locations = self.adjust_locations(locations).await?;
        Ok((locations, end_cursor))
    }

    /// Hover text from the first upload whose hover range maps back cleanly.
    pub async fn hover(&self, line: u32, character: u32) -> Result<Option<Hover>, QueryError> {
        let position = Position::new(line, character);

        for upload in &self.uploads {
            let Some(adjusted) = self.adjust_query_position(upload, position).await? else {
                continue;
            };

            let Some(hover) = self
                .guard(self.api.hover(&self.path, adjusted, upload.id))
                .await?
            else {
                continue;
            };
            if hover.text.is_empty() {
                continue;
            }

            // A multi-line hover span may cross an edited line even when the
            // hovered line itself is intact.
            let range = self
                .guard(
                    self.adjuster
                        .adjust_range(&upload.commit, &self.path, hover.range, true),
                )
                .await?;
            match range {
                Some(range) => {
                    return Ok(Some(Hover {
                        text: hover.text,
                        range,
                    }))
                }
                None => {
                    debug!(upload_id = upload.id, "Hover range does not map back; skipping");
                }
            }
        }

        Ok(None)
    }

    /// Up to `limit` diagnostics across uploads, and the summed total count.
    pub async fn diagnostics(
        &self,
        limit: i32,
    ) -> Result<(Vec<AdjustedDiagnostic>, usize), QueryError> {
        if limit <= 0 {
            return Err(QueryError::IllegalLimit);
        }
        let limit = limit as usize;

        let mut total_count = 0;
        let mut diagnostics = Vec::new();
        for upload in &self.uploads {
            let remaining = limit.saturating_sub(diagnostics.len());
            let page = self
                .guard(self.api.diagnostics(&self.path, upload.id, remaining, 0))
                .await?;
            total_count += page.total_count;
            diagnostics.extend(page.diagnostics);
        }

        let mut adjusted = Vec::with_capacity(diagnostics.len());
        for diagnostic in diagnostics {
            let (adjusted_commit, adjusted_range) = self
                .adjust_result(
                    diagnostic.dump.repository_id,
                    &diagnostic.dump.commit,
                    &diagnostic.diagnostic.path,
                    diagnostic.diagnostic.range(),
                )
                .await?;
            adjusted.push(AdjustedDiagnostic {
                diagnostic,
                adjusted_commit,
                adjusted_range,
            });
        }

        Ok((adjusted, total_count))
    }

    /// Move a result location into the requested commit where possible.
    ///
    /// Locations in other repositories are returned as indexed. A location
    /// whose range does not survive the diff keeps its own commit and range.
    pub async fn adjust_location(&self, location: Location) -> Result<AdjustedLocation, QueryError> {
        let (adjusted_commit, adjusted_range) = self
            .adjust_result(
                location.dump.repository_id,
                &location.dump.commit,
                &location.path,
                location.range,
            )
            .await?;

        Ok(AdjustedLocation {
            dump: location.dump,
            path: location.path,
            adjusted_commit,
            adjusted_range,
        })
    }

    async fn adjust_locations(
        &self,
        locations: Vec<Location>,
    ) -> Result<Vec<AdjustedLocation>, QueryError> {
        let mut adjusted = Vec::with_capacity(locations.len());
        for location in locations {
            adjusted.push(self.adjust_location(location).await?);
        }
        Ok(adjusted)
    }

    async fn adjust_result(
        &self,
        repository_id: RepositoryId,
        commit: &str,
        path: &str,
        range: Range,
    ) -> Result<(String, Range), QueryError> {
        if repository_id != self.repository_id {
            return Ok((commit.to_string(), range));
        }

        let adjusted = self
            .guard(self.adjuster.adjust_range(commit, path, range, true))
            .await?;
        match adjusted {
            Some(adjusted) => Ok((self.commit.clone(), adjusted)),
            None => {
                trace!(commit, path, "Keeping result at its indexed location");
                Ok((commit.to_string(), range))
            }
        }
    }

    /// The query position in `upload`'s commit, or `None` if the line was
    /// edited in between.
    async fn adjust_query_position(
        &self,
        upload: &Upload,
        position: Position,
    ) -> Result<Option<Position>, QueryError> {
        let adjusted = self
            .guard(
                self.adjuster
                    .adjust_position(&upload.commit, &self.path, position, false),
            )
            .await?;

        if adjusted.is_none() {
            debug!(
                upload_id = upload.id,
                commit = %upload.commit,
                line = position.line,
                "Position has no equivalent in upload commit; skipping upload"
            );
        }
        Ok(adjusted)
    }

    async fn guard<T, E>(
        &self,
        operation: impl Future<Output = Result<T, E>>,
    ) -> Result<T, QueryError>
    where
        QueryError: From<E>,
    {
        cancellable(&self.cancellation, operation).await
    }
}

/// Run `operation` unless `token` is cancelled first.
pub(crate) async fn cancellable<T, E>(
    token: &CancellationToken,
    operation: impl Future<Output = Result<T, E>>,
) -> Result<T, QueryError>
where
    QueryError: From<E>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(QueryError::Cancelled),
        result = operation => result.map_err(QueryError::from),
    }
}
