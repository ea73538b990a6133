//! A JSON-file index implementing every backend the query engine needs.
//!
//! The file lists repositories, resolvable revisions, uploads in rank order,
//! the symbols each upload knows about and its diagnostics:
//!
//! ```json
//! {
//!   "repositories": [{ "id": 50, "name": "github.com/example/app" }],
//!   "revisions": [{ "repository_id": 50, "rev": "HEAD", "oid": "4f1c2e" }],
//!   "uploads": [{ "id": 1, "repository_id": 50, "commit": "4f1c2e" }],
//!   "symbols": [{
//!     "upload_id": 1, "path": "main.go",
//!     "range": { "start": { "line": 3, "character": 5 }, "end": { "line": 3, "character": 9 } },
//!     "hover": "func main()",
//!     "definitions": [{ "upload_id": 1, "path": "main.go", "range": { ... } }],
//!     "references": []
//!   }],
//!   "diagnostics": [{ "upload_id": 1, "path": "main.go", "severity": 1, ... }]
//! }
//! ```

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use codenav_core::{
    Commit, Diagnostic, DiagnosticsPage, Hover, Location, NavigationApi, ReferencesPage,
    ReferencesRequest, Repository, RepositoryStore, ResolvedDiagnostic, TreeEntry, Upload,
    UploadId, UploadStore, UploadsQuery,
};
use codenav_diff::{Position, Range, RepositoryId};
use serde::Deserialize;
use tracing::debug;

/// Processing state every fixture upload is in.
const COMPLETED: &str = "completed";

/// Revision naming the tip of the default branch.
const TIP_REVISION: &str = "HEAD";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureIndex {
    #[serde(default)]
    pub repositories: Vec<Repository>,
    #[serde(default)]
    pub revisions: Vec<FixtureRevision>,
    /// Ranked best first.
    #[serde(default)]
    pub uploads: Vec<Upload>,
    #[serde(default)]
    pub symbols: Vec<FixtureSymbol>,
    #[serde(default)]
    pub diagnostics: Vec<FixtureDiagnostic>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureRevision {
    pub repository_id: RepositoryId,
    pub rev: String,
    pub oid: String,
}

/// A symbol occurrence and what the index knows about it.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureSymbol {
    pub upload_id: UploadId,
    pub path: String,
    pub range: Range,
    #[serde(default)]
    pub hover: Option<String>,
    #[serde(default)]
    pub definitions: Vec<FixtureLocation>,
    #[serde(default)]
    pub references: Vec<FixtureLocation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureLocation {
    pub upload_id: UploadId,
    pub path: String,
    pub range: Range,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureDiagnostic {
    pub upload_id: UploadId,
    #[serde(flatten)]
    pub diagnostic: Diagnostic,
}

impl FixtureIndex {
    /// Read and parse an index file.
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read index {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("Failed to parse index {}", path.display()))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let index: FixtureIndex = serde_json::from_str(contents)?;
        debug!(
            repositories = index.repositories.len(),
            uploads = index.uploads.len(),
            symbols = index.symbols.len(),
            diagnostics = index.diagnostics.len(),
            "Loaded index fixture"
        );
        Ok(index)
    }

    fn upload(&self, id: UploadId) -> Option<&Upload> {
        self.uploads.iter().find(|upload| upload.id == id)
    }

    fn symbol_at(&self, upload_id: UploadId, path: &str, position: Position) -> Option<&FixtureSymbol> {
        self.symbols.iter().find(|symbol| {
            symbol.upload_id == upload_id && symbol.path == path && contains(symbol.range, position)
        })
    }

    fn locations(&self, locations: &[FixtureLocation]) -> Result<Vec<Location>> {
        locations
            .iter()
            .map(|location| {
                let dump = self
                    .upload(location.upload_id)
                    .ok_or_else(|| anyhow!("location refers to unknown upload {}", location.upload_id))?;
                Ok(Location {
                    dump: dump.clone(),
                    path: location.path.clone(),
                    range: location.range,
                })
            })
            .collect()
    }

    fn has_path(&self, upload_id: UploadId, path: &str) -> bool {
        self.symbols
            .iter()
            .any(|symbol| symbol.upload_id == upload_id && symbol.path == path)
            || self
                .diagnostics
                .iter()
                .any(|entry| entry.upload_id == upload_id && entry.diagnostic.path == path)
    }

    fn tip_commit(&self, repository_id: RepositoryId) -> Option<&str> {
        self.revisions
            .iter()
            .find(|revision| revision.repository_id == repository_id && revision.rev == TIP_REVISION)
            .map(|revision| revision.oid.as_str())
    }

    fn matches(&self, upload: &Upload, query: &UploadsQuery) -> bool {
        if query.repository_id.is_some_and(|id| id != upload.repository_id) {
            return false;
        }
        if query.state.as_deref().is_some_and(|state| state != COMPLETED) {
            return false;
        }
        if let Some(term) = query.term.as_deref() {
            let found = [&upload.commit, &upload.root, &upload.indexer]
                .iter()
                .any(|field| field.contains(term));
            if !found {
                return false;
            }
        }
        if query.visible_at_tip && self.tip_commit(upload.repository_id) != Some(upload.commit.as_str()) {
            return false;
        }
        true
    }
}

/// LSP ranges are end-exclusive.
fn contains(range: Range, position: Position) -> bool {
    let at = (position.line, position.character);
    (range.start.line, range.start.character) <= at && at < (range.end.line, range.end.character)
}

/// `path` is `prefix` itself or lies beneath it.
fn under(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    prefix.is_empty()
        || path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[async_trait]
impl NavigationApi for FixtureIndex {
    async fn definitions(
        &self,
        path: &str,
        position: Position,
        upload_id: UploadId,
    ) -> Result<Vec<Location>> {
        match self.symbol_at(upload_id, path, position) {
            Some(symbol) => self.locations(&symbol.definitions),
            None => Ok(Vec::new()),
        }
    }

    async fn references(
        &self,
        _repository_id: RepositoryId,
        _commit: &str,
        limit: usize,
        request: &ReferencesRequest,
    ) -> Result<ReferencesPage> {
        let Some(symbol) = self.symbol_at(request.upload_id, &request.path, request.position) else {
            return Ok(ReferencesPage::default());
        };

        // The page token is the offset of the next reference.
        let offset = match request.token.as_deref() {
            Some(token) => token
                .parse::<usize>()
                .with_context(|| format!("malformed references token {:?}", token))?,
            None => 0,
        };
        let end = offset.saturating_add(limit).min(symbol.references.len());
        let page = symbol.references.get(offset..end).unwrap_or_default();

        Ok(ReferencesPage {
            locations: self.locations(page)?,
            next: (end < symbol.references.len()).then(|| end.to_string()),
        })
    }

    async fn hover(&self, path: &str, position: Position, upload_id: UploadId) -> Result<Option<Hover>> {
        Ok(self
            .symbol_at(upload_id, path, position)
            .and_then(|symbol| {
                symbol.hover.as_ref().map(|text| Hover {
                    text: text.clone(),
                    range: symbol.range,
                })
            }))
    }

    async fn diagnostics(
        &self,
        path: &str,
        upload_id: UploadId,
        limit: usize,
        offset: usize,
    ) -> Result<DiagnosticsPage> {
        let dump = self
            .upload(upload_id)
            .ok_or_else(|| anyhow!("unknown upload {}", upload_id))?;
        let matching: Vec<&FixtureDiagnostic> = self
            .diagnostics
            .iter()
            .filter(|entry| entry.upload_id == upload_id && under(&entry.diagnostic.path, path))
            .collect();

        Ok(DiagnosticsPage {
            total_count: matching.len(),
            diagnostics: matching
                .into_iter()
                .skip(offset)
                .take(limit)
                .map(|entry| ResolvedDiagnostic {
                    dump: dump.clone(),
                    diagnostic: entry.diagnostic.clone(),
                })
                .collect(),
        })
    }

    async fn find_closest_dumps(
        &self,
        repository_id: RepositoryId,
        commit: &str,
        path: &str,
        exact_path: bool,
        indexer: Option<&str>,
    ) -> Result<Vec<Upload>> {
        let mut dumps: Vec<Upload> = self
            .uploads
            .iter()
            .filter(|upload| upload.repository_id == repository_id)
            .filter(|upload| indexer.map_or(true, |indexer| upload.indexer == indexer))
            .filter(|upload| under(path, &upload.root))
            .filter(|upload| !exact_path || self.has_path(upload.id, path))
            .cloned()
            .collect();
        // Uploads of the requested commit need no adjustment; keep them first.
        dumps.sort_by_key(|upload| upload.commit != commit);
        Ok(dumps)
    }
}

#[async_trait]
impl UploadStore for FixtureIndex {
    async fn upload_by_id(&self, id: UploadId) -> Result<Option<Upload>> {
        Ok(self.upload(id).cloned())
    }

    async fn uploads(&self, query: &UploadsQuery) -> Result<(Vec<Upload>, usize)> {
        let matching: Vec<&Upload> = self
            .uploads
            .iter()
            .filter(|upload| self.matches(upload, query))
            .collect();
        let total = matching.len();
        let page = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect();
        Ok((page, total))
    }
}

#[async_trait]
impl RepositoryStore for FixtureIndex {
    async fn repository(&self, id: RepositoryId) -> Result<Repository> {
        match self.repositories.iter().find(|repository| repository.id == id) {
            Some(repository) => Ok(repository.clone()),
            None => bail!("repository {} not found", id),
        }
    }

    async fn resolve_revision(&self, repository: &Repository, rev: &str) -> Result<Option<Commit>> {
        let revision = self.revisions.iter().find(|revision| {
            revision.repository_id == repository.id && (revision.rev == rev || revision.oid == rev)
        });
        Ok(revision.map(|revision| Commit {
            repository: repository.clone(),
            oid: revision.oid.clone(),
            rev: rev.to_string(),
        }))
    }

    async fn tree_entry(&self, commit: &Commit, path: &str) -> Result<TreeEntry> {
        Ok(TreeEntry {
            commit: commit.clone(),
            path: path.to_string(),
        })
    }
}
