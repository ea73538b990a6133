//! Session-scoped memoization of repository, commit and path resolution.
//!
//! Turning results into presentation entities means resolving the same
//! repositories, revisions and files over and over. A
//! [`CachedLocationResolver`] lives for one top-level request and resolves
//! each key at most once, however many tasks ask for it concurrently.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use codenav_diff::{Range, RepositoryId};
use serde::Serialize;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, trace};

use crate::api::RepositoryStore;
use crate::error::QueryError;
use crate::types::{AdjustedDiagnostic, AdjustedLocation, Commit, Repository, TreeEntry};

/// A concurrent memoizing map.
///
/// Each key owns a cell that is initialized at most once. Callers racing on
/// the same key wait for the first initialization instead of repeating it.
/// If initialization fails the cell stays empty and the next caller retries.
pub struct Memo<K, V> {
    cells: RwLock<HashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            cells: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Memo<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached value for `key`, or the result of `init` stored under it.
    pub async fn get_or_try_init<F, Fut, E>(&self, key: K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = self.cell(key).await;
        cell.get_or_try_init(init).await.cloned()
    }

    async fn cell(&self, key: K) -> Arc<OnceCell<V>> {
        // Fast path
        {
            let cells = self.cells.read().await;
            if let Some(cell) = cells.get(&key) {
                return Arc::clone(cell);
            }
        }

        // Another task may have inserted the key since the read lock was dropped.
        let mut cells = self.cells.write().await;
        Arc::clone(cells.entry(key).or_default())
    }
}

/// A result location ready for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationNode {
    pub repository: String,
    pub commit: String,
    pub path: String,
    pub range: Range,
}

impl LocationNode {
    fn new(entry: &TreeEntry, range: Range) -> Self {
        Self {
            repository: entry.commit.repository.name.clone(),
            commit: entry.commit.oid.clone(),
            path: entry.path.clone(),
            range,
        }
    }
}

type CommitKey = (RepositoryId, String);
type PathKey = (RepositoryId, String, String);

/// Resolves repositories, commits and paths through a [`RepositoryStore`],
/// remembering every answer for the lifetime of the resolver.
///
/// A revision that does not exist resolves to `None`, and that answer is
/// remembered too.
pub struct CachedLocationResolver {
    store: Arc<dyn RepositoryStore>,
    repositories: Memo<RepositoryId, Repository>,
    commits: Memo<CommitKey, Option<Commit>>,
    paths: Memo<PathKey, Option<TreeEntry>>,
}

impl CachedLocationResolver {
    pub fn new(store: Arc<dyn RepositoryStore>) -> Self {
        Self {
            store,
            repositories: Memo::new(),
            commits: Memo::new(),
            paths: Memo::new(),
        }
    }

    /// The repository with the given id.
    pub async fn repository(&self, id: RepositoryId) -> Result<Repository, QueryError> {
        self.repositories
            .get_or_try_init(id, move || async move {
                trace!(repository_id = id, "Resolving repository");
                Ok::<_, QueryError>(self.store.repository(id).await?)
            })
            .await
    }

    /// The commit `rev` resolves to, or `None` if it does not exist.
    pub async fn commit(&self, id: RepositoryId, rev: &str) -> Result<Option<Commit>, QueryError> {
        self.commits
            .get_or_try_init((id, rev.to_string()), move || async move {
                let repository = self.repository(id).await?;
                let commit = self.store.resolve_revision(&repository, rev).await?;
                if commit.is_none() {
                    debug!(repository_id = id, rev, "Revision not found");
                }
                Ok::<_, QueryError>(commit)
            })
            .await
    }

    /// The file `path` at `rev`, or `None` if the revision does not exist.
    pub async fn path(
        &self,
        id: RepositoryId,
        rev: &str,
        path: &str,
    ) -> Result<Option<TreeEntry>, QueryError> {
        self.paths
            .get_or_try_init((id, rev.to_string(), path.to_string()), move || async move {
                let Some(commit) = self.commit(id, rev).await? else {
                    return Ok(None);
                };
                Ok::<_, QueryError>(Some(self.store.tree_entry(&commit, path).await?))
            })
            .await
    }

    /// Resolve one adjusted location, `None` if its commit does not exist.
    pub async fn resolve_location(
        &self,
        location: &AdjustedLocation,
    ) -> Result<Option<LocationNode>, QueryError> {
        let entry = self
            .path(
                location.dump.repository_id,
                &location.adjusted_commit,
                &location.path,
            )
            .await?;
        Ok(entry.map(|entry| LocationNode::new(&entry, location.adjusted_range)))
    }

    /// Resolve adjusted locations in order, dropping those whose commit does
    /// not exist.
    pub async fn resolve_locations(
        &self,
        locations: &[AdjustedLocation],
    ) -> Result<Vec<LocationNode>, QueryError> {
        let mut nodes = Vec::with_capacity(locations.len());
        for location in locations {
            if let Some(node) = self.resolve_location(location).await? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    /// Resolve the location of one adjusted diagnostic.
    pub async fn resolve_diagnostic(
        &self,
        diagnostic: &AdjustedDiagnostic,
    ) -> Result<Option<LocationNode>, QueryError> {
        let entry = self
            .path(
                diagnostic.diagnostic.dump.repository_id,
                &diagnostic.adjusted_commit,
                &diagnostic.diagnostic.diagnostic.path,
            )
            .await?;
        Ok(entry.map(|entry| LocationNode::new(&entry, diagnostic.adjusted_range)))
    }
}
