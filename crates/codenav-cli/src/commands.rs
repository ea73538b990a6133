//! Command implementations. Each returns its result as JSON.

use std::sync::Arc;

use anyhow::{Context, Result};
use codenav_config::Config;
use codenav_core::{
    decode_offset_cursor, PagedPositionArgs, PositionArgs, QueryConnection, Resolver,
    UploadsQuery,
};
use codenav_diff::{adjust_position, adjust_range, DiffSource, GitDiffSource, Position, Range};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::fixture::FixtureIndex;
use crate::{AdjustArgs, PositionFlags, QueryArgs, QueryCommand, UploadsArgs};

/// A diff source over the checkouts listed in `git.repositories`.
pub fn git_diff_source(config: &Config) -> Result<GitDiffSource> {
    let paths = config
        .git
        .repository_paths()
        .context("Invalid git.repositories")?;

    let mut source = GitDiffSource::new(config.git.binary.as_str());
    for (id, path) in paths {
        debug!(repository_id = id, path = %path.display(), "Registered checkout");
        source = source.with_repository(id, path);
    }
    Ok(source)
}

/// Map a position, or a range when both end flags are given.
pub async fn adjust(args: &AdjustArgs, config: &Config) -> Result<Value> {
    let source = git_diff_source(config)?;
    let hunks = source
        .diff(args.repository, &args.source, &args.target, &args.path)
        .await
        .with_context(|| {
            format!(
                "Failed to diff {} from {} to {}",
                args.path, args.source, args.target
            )
        })?;
    debug!(path = %args.path, hunks = hunks.len(), "Diffed file");

    let start = Position::new(args.position.line, args.position.character);
    let output = match (args.end_line, args.end_character) {
        (Some(line), Some(character)) => {
            let range = Range::new(start, Position::new(line, character));
            json!({ "range": adjust_range(&hunks, range) })
        }
        _ => json!({ "position": adjust_position(&hunks, start) }),
    };
    Ok(output)
}

/// Answer a navigation query, or `null` when no upload covers the path.
pub async fn query(
    args: &QueryArgs,
    config: &Config,
    cancellation: CancellationToken,
) -> Result<Value> {
    let index = Arc::new(FixtureIndex::load(&args.index).await?);
    let resolver = Resolver::new(index.clone(), Arc::new(git_diff_source(config)?), index.clone())
        .with_cancellation(cancellation);

    let query = resolver
        .query_resolver(
            args.repository,
            &args.commit,
            &args.path,
            !args.directory,
            args.indexer.as_deref(),
        )
        .await
        .context("Failed to find uploads")?;
    let Some(query) = query else {
        info!(path = %args.path, commit = %args.commit, "No uploads cover this path");
        return Ok(Value::Null);
    };

    let connection = QueryConnection::new(query, index)
        .with_references_page_size(config.query.references_page_size)
        .with_diagnostics_page_size(config.query.diagnostics_page_size);

    let output = match &args.query {
        QueryCommand::Definitions(position) => serde_json::to_value(
            connection
                .definitions(position_args(*position))
                .await
                .context("Definitions query failed")?,
        )?,
        QueryCommand::References {
            position,
            first,
            after,
        } => {
            let args = PagedPositionArgs {
                line: position.line,
                character: position.character,
                first: *first,
                after: after.clone(),
            };
            serde_json::to_value(
                connection
                    .references(&args)
                    .await
                    .context("References query failed")?,
            )?
        }
        QueryCommand::Hover(position) => serde_json::to_value(
            connection
                .hover(position_args(*position))
                .await
                .context("Hover query failed")?,
        )?,
        QueryCommand::Diagnostics { first } => serde_json::to_value(
            connection
                .diagnostics(*first)
                .await
                .context("Diagnostics query failed")?,
        )?,
    };
    Ok(output)
}

/// List uploads, or show one with `--id`.
pub async fn uploads(
    args: &UploadsArgs,
    config: &Config,
    cancellation: CancellationToken,
) -> Result<Value> {
    let index = Arc::new(FixtureIndex::load(&args.index).await?);
    let resolver = Resolver::new(index.clone(), Arc::new(git_diff_source(config)?), index)
        .with_cancellation(cancellation);

    if let Some(id) = args.id {
        let upload = resolver
            .upload_by_id(id)
            .await
            .with_context(|| format!("Failed to look up upload {}", id))?;
        return Ok(serde_json::to_value(upload)?);
    }

    let offset = decode_offset_cursor(args.after.as_deref()).context("Invalid --after cursor")?;
    let query = UploadsQuery {
        repository_id: args.repository,
        state: args.state.as_ref().map(|state| state.to_lowercase()),
        term: args.term.clone(),
        visible_at_tip: args.visible_at_tip,
        limit: args.limit,
        offset,
    };
    let page = resolver
        .uploads(&query)
        .await
        .context("Failed to list uploads")?;
    Ok(serde_json::to_value(page)?)
}

fn position_args(position: PositionFlags) -> PositionArgs {
    PositionArgs {
        line: position.line,
        character: position.character,
    }
}
