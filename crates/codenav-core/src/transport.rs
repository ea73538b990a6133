//! Request-facing adapter over [`QueryResolver`].
//!
//! Applies default page sizes, validates limits, decodes cursors and turns
//! adjusted results into presentation nodes through one session-scoped
//! [`CachedLocationResolver`].

use std::sync::Arc;

use codenav_diff::Range;
use serde::Serialize;

use crate::api::RepositoryStore;
use crate::cursor::decode_cursor;
use crate::error::QueryError;
use crate::location::{CachedLocationResolver, LocationNode};
use crate::query::{cancellable, QueryResolver};
use crate::types::{AdjustedDiagnostic, AdjustedLocation};

/// Reference result page size when no limit is supplied.
pub const DEFAULT_REFERENCES_PAGE_SIZE: i32 = 100;

/// Diagnostic result page size when no limit is supplied.
pub const DEFAULT_DIAGNOSTICS_PAGE_SIZE: i32 = 100;

/// A zero-indexed position in the requested commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionArgs {
    pub line: u32,
    pub character: u32,
}

/// A position plus paging arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagedPositionArgs {
    pub line: u32,
    pub character: u32,
    /// Page size; the configured default when absent.
    pub first: Option<i32>,
    /// Cursor returned by the previous page.
    pub after: Option<String>,
}

/// A page of locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationConnection {
    pub nodes: Vec<LocationNode>,
    /// Cursor for the next page, absent on the last page.
    pub end_cursor: Option<String>,
}

impl LocationConnection {
    pub fn has_next_page(&self) -> bool {
        self.end_cursor.is_some()
    }
}

/// Hover text and the span it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoverNode {
    pub markdown: String,
    pub range: Range,
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

impl Severity {
    /// Map an LSP severity number.
    pub fn from_lsp(severity: i32) -> Result<Self, QueryError> {
        match severity {
            1 => Ok(Severity::Error),
            2 => Ok(Severity::Warning),
            3 => Ok(Severity::Information),
            4 => Ok(Severity::Hint),
            other => Err(QueryError::UnknownSeverity(other)),
        }
    }
}

/// A diagnostic ready for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticNode {
    pub severity: Severity,
    pub code: Option<String>,
    pub message: Option<String>,
    pub source: Option<String>,
    /// Absent when the diagnostic's commit no longer exists.
    pub location: Option<LocationNode>,
}

/// A page of diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticConnection {
    pub nodes: Vec<DiagnosticNode>,
    pub total_count: usize,
}

/// Serves the queries of one request.
///
/// Owns the location cache for that request; drop the connection to discard
/// it.
pub struct QueryConnection {
    resolver: QueryResolver,
    locations: CachedLocationResolver,
    references_page_size: i32,
    diagnostics_page_size: i32,
}

impl QueryConnection {
    pub fn new(resolver: QueryResolver, store: Arc<dyn RepositoryStore>) -> Self {
        Self {
            resolver,
            locations: CachedLocationResolver::new(store),
            references_page_size: DEFAULT_REFERENCES_PAGE_SIZE,
            diagnostics_page_size: DEFAULT_DIAGNOSTICS_PAGE_SIZE,
        }
    }

    /// Set the references page size used when a request gives none.
    pub fn with_references_page_size(mut self, size: i32) -> Self {
        self.references_page_size = size;
        self
    }

    /// Set the diagnostics page size used when a request gives none.
    pub fn with_diagnostics_page_size(mut self, size: i32) -> Self {
        self.diagnostics_page_size = size;
        self
    }

    pub async fn definitions(&self, args: PositionArgs) -> Result<LocationConnection, QueryError> {
        let locations = self
            .resolver
            .definitions(args.line, args.character)
            .await?;
        let nodes = self.location_nodes(&locations).await?;
        Ok(LocationConnection {
            nodes,
            end_cursor: None,
        })
    }

    pub async fn references(
        &self,
        args: &PagedPositionArgs,
    ) -> Result<LocationConnection, QueryError> {
        let limit = args.first.unwrap_or(self.references_page_size);
        if limit <= 0 {
            return Err(QueryError::IllegalLimit);
        }
        let cursor = decode_cursor(args.after.as_deref())?;

        let (locations, end_cursor) = self
            .resolver
            .references(args.line, args.character, limit, &cursor)
            .await?;
        let nodes = self.location_nodes(&locations).await?;
        Ok(LocationConnection {
            nodes,
            end_cursor: (!end_cursor.is_empty()).then_some(end_cursor),
        })
    }

    pub async fn hover(&self, args: PositionArgs) -> Result<Option<HoverNode>, QueryError> {
        let hover = self.resolver.hover(args.line, args.character).await?;
        Ok(hover.map(|hover| HoverNode {
            markdown: hover.text,
            range: hover.range,
        }))
    }

    pub async fn diagnostics(&self, first: Option<i32>) -> Result<DiagnosticConnection, QueryError> {
        let limit = first.unwrap_or(self.diagnostics_page_size);
        if limit <= 0 {
            return Err(QueryError::IllegalLimit);
        }

        let (diagnostics, total_count) = self.resolver.diagnostics(limit).await?;
        let mut nodes = Vec::with_capacity(diagnostics.len());
        for diagnostic in &diagnostics {
            nodes.push(self.diagnostic_node(diagnostic).await?);
        }
        Ok(DiagnosticConnection { nodes, total_count })
    }

    async fn diagnostic_node(
        &self,
        adjusted: &AdjustedDiagnostic,
    ) -> Result<DiagnosticNode, QueryError> {
        let diagnostic = &adjusted.diagnostic.diagnostic;
        let severity = Severity::from_lsp(diagnostic.severity)?;
        let location = cancellable(
            self.resolver.cancellation_token(),
            self.locations.resolve_diagnostic(adjusted),
        )
        .await?;

        Ok(DiagnosticNode {
            severity,
            code: non_empty(&diagnostic.code),
            message: non_empty(&diagnostic.message),
            source: non_empty(&diagnostic.source),
            location,
        })
    }

    async fn location_nodes(
        &self,
        locations: &[AdjustedLocation],
    ) -> Result<Vec<LocationNode>, QueryError> {
        cancellable(
            self.resolver.cancellation_token(),
            self.locations.resolve_locations(locations),
        )
        .await
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
