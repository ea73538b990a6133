//! In-memory backends recording every call, shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;
use codenav_core::{
    Commit, DiagnosticsPage, Hover, Location, NavigationApi, ReferencesPage, ReferencesRequest,
    Repository, RepositoryStore, ResolvedDiagnostic, TreeEntry, Upload, UploadId, UploadStore,
    UploadsQuery,
};
use codenav_diff::{DiffError, DiffHunk, DiffSource, Position, Range, RepositoryId};

pub const REPOSITORY_ID: RepositoryId = 50;
pub const REQUESTED_COMMIT: &str = "head";

pub fn upload(id: UploadId, commit: &str) -> Upload {
    Upload {
        id,
        repository_id: REPOSITORY_ID,
        commit: commit.to_string(),
        root: String::new(),
        indexer: "lsif-go".to_string(),
    }
}

pub fn range(start_line: u32, start_character: u32, end_line: u32, end_character: u32) -> Range {
    Range::new(
        Position::new(start_line, start_character),
        Position::new(end_line, end_character),
    )
}

pub fn location(dump: &Upload, path: &str, range: Range) -> Location {
    Location {
        dump: dump.clone(),
        path: path.to_string(),
        range,
    }
}

/// Original lines 10-12 become lines 10-11; one-indexed line 12 is deleted.
pub fn deletion_hunk() -> DiffHunk {
    DiffHunk::new(
        10,
        3,
        10,
        2,
        vec![" ten".to_string(), " eleven".to_string(), "-twelve".to_string()],
    )
}

/// A navigation API call, as observed by [`FakeNavigationApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Definitions {
        upload_id: UploadId,
        position: Position,
    },
    References {
        upload_id: UploadId,
        position: Position,
        limit: usize,
        token: Option<String>,
    },
    Hover {
        upload_id: UploadId,
        position: Position,
    },
    Diagnostics {
        upload_id: UploadId,
        limit: usize,
    },
    FindClosestDumps {
        repository_id: RepositoryId,
        commit: String,
        path: String,
    },
}

#[derive(Default)]
pub struct FakeNavigationApi {
    pub definitions: HashMap<UploadId, Vec<Location>>,
    pub references: HashMap<(UploadId, Option<String>), ReferencesPage>,
    pub hovers: HashMap<UploadId, Hover>,
    pub diagnostics: HashMap<UploadId, Vec<ResolvedDiagnostic>>,
    pub dumps: Vec<Upload>,
    pub fail: bool,
    calls: Mutex<Vec<Call>>,
}

impl FakeNavigationApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records calls, then fails every one of them.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Answers closest-dumps lookups with `dumps`.
    pub fn with_dumps(dumps: Vec<Upload>) -> Self {
        Self {
            dumps,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            return Err(anyhow!("index backend unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl NavigationApi for FakeNavigationApi {
    async fn definitions(
        &self,
        _path: &str,
        position: Position,
        upload_id: UploadId,
    ) -> anyhow::Result<Vec<Location>> {
        self.record(Call::Definitions {
            upload_id,
            position,
        })?;
        Ok(self.definitions.get(&upload_id).cloned().unwrap_or_default())
    }

    async fn references(
        &self,
        _repository_id: RepositoryId,
        _commit: &str,
        limit: usize,
        request: &ReferencesRequest,
    ) -> anyhow::Result<ReferencesPage> {
        self.record(Call::References {
            upload_id: request.upload_id,
            position: request.position,
            limit,
            token: request.token.clone(),
        })?;
        Ok(self
            .references
            .get(&(request.upload_id, request.token.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn hover(
        &self,
        _path: &str,
        position: Position,
        upload_id: UploadId,
    ) -> anyhow::Result<Option<Hover>> {
        self.record(Call::Hover {
            upload_id,
            position,
        })?;
        Ok(self.hovers.get(&upload_id).cloned())
    }

    async fn diagnostics(
        &self,
        _path: &str,
        upload_id: UploadId,
        limit: usize,
        offset: usize,
    ) -> anyhow::Result<DiagnosticsPage> {
        self.record(Call::Diagnostics { upload_id, limit })?;
        let all = self.diagnostics.get(&upload_id).cloned().unwrap_or_default();
        Ok(DiagnosticsPage {
            total_count: all.len(),
            diagnostics: all.into_iter().skip(offset).take(limit).collect(),
        })
    }

    async fn find_closest_dumps(
        &self,
        repository_id: RepositoryId,
        commit: &str,
        path: &str,
        _exact_path: bool,
        _indexer: Option<&str>,
    ) -> anyhow::Result<Vec<Upload>> {
        self.record(Call::FindClosestDumps {
            repository_id,
            commit: commit.to_string(),
            path: path.to_string(),
        })?;
        Ok(self.dumps.clone())
    }
}

/// Serves hunks keyed by (source, target) commit; unknown pairs have no diff.
#[derive(Default)]
pub struct ScriptedDiffSource {
    pub hunks: HashMap<(String, String), Vec<DiffHunk>>,
    pub fail: bool,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl ScriptedDiffSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_hunks(mut self, source: &str, target: &str, hunks: Vec<DiffHunk>) -> Self {
        self.hunks
            .insert((source.to_string(), target.to_string()), hunks);
        self
    }

    /// (source, target, path) of every diff requested.
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DiffSource for ScriptedDiffSource {
    async fn diff(
        &self,
        _repository_id: RepositoryId,
        source_commit: &str,
        target_commit: &str,
        path: &str,
    ) -> Result<Vec<DiffHunk>, DiffError> {
        self.calls.lock().unwrap().push((
            source_commit.to_string(),
            target_commit.to_string(),
            path.to_string(),
        ));
        if self.fail {
            return Err(DiffError::Git {
                status: "exit status: 128".to_string(),
                stderr: "fatal: bad object".to_string(),
            });
        }
        Ok(self
            .hunks
            .get(&(source_commit.to_string(), target_commit.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

/// Resolves every repository id and the revisions in `revisions`; counts
/// calls and yields before answering so concurrent lookups overlap.
#[derive(Default)]
pub struct FakeRepositoryStore {
    pub revisions: HashSet<String>,
    pub repository_calls: AtomicUsize,
    pub revision_calls: AtomicUsize,
    pub tree_entry_calls: AtomicUsize,
}

impl FakeRepositoryStore {
    pub fn with_revisions(revisions: &[&str]) -> Self {
        Self {
            revisions: revisions.iter().map(|rev| rev.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn repository_calls(&self) -> usize {
        self.repository_calls.load(Ordering::SeqCst)
    }

    pub fn revision_calls(&self) -> usize {
        self.revision_calls.load(Ordering::SeqCst)
    }

    pub fn tree_entry_calls(&self) -> usize {
        self.tree_entry_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepositoryStore for FakeRepositoryStore {
    async fn repository(&self, id: RepositoryId) -> anyhow::Result<Repository> {
        self.repository_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if id < 0 {
            return Err(anyhow!("repository {} not found", id));
        }
        Ok(Repository {
            id,
            name: format!("github.com/example/repo-{}", id),
        })
    }

    async fn resolve_revision(
        &self,
        repository: &Repository,
        rev: &str,
    ) -> anyhow::Result<Option<Commit>> {
        self.revision_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if !self.revisions.contains(rev) {
            return Ok(None);
        }
        Ok(Some(Commit {
            repository: repository.clone(),
            oid: format!("{}-oid", rev),
            rev: rev.to_string(),
        }))
    }

    async fn tree_entry(&self, commit: &Commit, path: &str) -> anyhow::Result<TreeEntry> {
        self.tree_entry_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(TreeEntry {
            commit: commit.clone(),
            path: path.to_string(),
        })
    }
}

#[derive(Default)]
pub struct FakeUploadStore {
    pub uploads: Vec<Upload>,
    queries: Mutex<Vec<UploadsQuery>>,
}

impl FakeUploadStore {
    pub fn new(uploads: Vec<Upload>) -> Self {
        Self {
            uploads,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<UploadsQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl UploadStore for FakeUploadStore {
    async fn upload_by_id(&self, id: UploadId) -> anyhow::Result<Option<Upload>> {
        Ok(self.uploads.iter().find(|upload| upload.id == id).cloned())
    }

    async fn uploads(&self, query: &UploadsQuery) -> anyhow::Result<(Vec<Upload>, usize)> {
        self.queries.lock().unwrap().push(query.clone());
        let matching: Vec<Upload> = self
            .uploads
            .iter()
            .filter(|upload| {
                query
                    .repository_id
                    .map_or(true, |id| upload.repository_id == id)
            })
            .cloned()
            .collect();
        let total = matching.len();
        let page = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();
        Ok((page, total))
    }
}
