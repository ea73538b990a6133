//! Command-line front end.
//!
//! `adjust` moves a position between two commits of a local checkout using
//! `git diff`. `query` and `uploads` run the query engine against a JSON index
//! fixture (see [`fixture`]), adjusting positions with the same git
//! checkouts. Results are printed as JSON on stdout; logs go to stderr.

pub mod commands;
pub mod fixture;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use codenav_config::Config;
use codenav_core::DEFAULT_UPLOADS_PAGE_SIZE;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "codenav")]
#[command(version, about = "Commit-aware code navigation over precomputed indexes")]
pub struct Cli {
    /// Configuration file [default: <config dir>/codenav/config.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Move a position or range from one commit to another
    Adjust(AdjustArgs),
    /// Run a navigation query against an index file
    Query(QueryArgs),
    /// List the uploads of an index file
    Uploads(UploadsArgs),
}

/// A zero-indexed position.
#[derive(Args, Debug, Clone, Copy)]
pub struct PositionFlags {
    #[arg(long)]
    pub line: u32,
    #[arg(long)]
    pub character: u32,
}

#[derive(Args, Debug)]
pub struct AdjustArgs {
    /// Repository id, as configured under git.repositories
    #[arg(long)]
    pub repository: i64,
    /// Commit the position is expressed in
    #[arg(long)]
    pub source: String,
    /// Commit to move the position into
    #[arg(long)]
    pub target: String,
    #[arg(long)]
    pub path: String,
    #[command(flatten)]
    pub position: PositionFlags,
    /// Adjust the range ending here instead of a single position
    #[arg(long, requires = "end_character")]
    pub end_line: Option<u32>,
    #[arg(long, requires = "end_line")]
    pub end_character: Option<u32>,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// JSON index file
    #[arg(long)]
    pub index: PathBuf,
    #[arg(long)]
    pub repository: i64,
    /// Commit the query position is expressed in
    #[arg(long)]
    pub commit: String,
    #[arg(long)]
    pub path: String,
    /// Treat --path as a directory prefix rather than a file
    #[arg(long)]
    pub directory: bool,
    /// Only consider uploads produced by this indexer
    #[arg(long)]
    pub indexer: Option<String>,

    #[command(subcommand)]
    pub query: QueryCommand,
}

#[derive(Subcommand, Debug)]
pub enum QueryCommand {
    /// Definitions of the symbol at a position
    Definitions(PositionFlags),
    /// One page of references to the symbol at a position
    References {
        #[command(flatten)]
        position: PositionFlags,
        /// Page size [default: query.references_page_size]
        #[arg(long, allow_negative_numbers = true)]
        first: Option<i32>,
        /// end_cursor of the previous page
        #[arg(long)]
        after: Option<String>,
    },
    /// Hover text at a position
    Hover(PositionFlags),
    /// Diagnostics for a file or directory
    Diagnostics {
        /// Page size [default: query.diagnostics_page_size]
        #[arg(long, allow_negative_numbers = true)]
        first: Option<i32>,
    },
}

#[derive(Args, Debug)]
pub struct UploadsArgs {
    /// JSON index file
    #[arg(long)]
    pub index: PathBuf,
    /// Show a single upload
    #[arg(long, conflicts_with_all = ["repository", "state", "term", "visible_at_tip"])]
    pub id: Option<i64>,
    #[arg(long)]
    pub repository: Option<i64>,
    #[arg(long)]
    pub state: Option<String>,
    /// Match commit, root or indexer
    #[arg(long)]
    pub term: Option<String>,
    #[arg(long)]
    pub visible_at_tip: bool,
    #[arg(long, default_value_t = DEFAULT_UPLOADS_PAGE_SIZE)]
    pub limit: usize,
    /// end_cursor of the previous page
    #[arg(long)]
    pub after: Option<String>,
}

/// Parse arguments, run one command and print its result.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging(&config);

    let cancellation = CancellationToken::new();
    let on_interrupt = cancellation.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling");
            on_interrupt.cancel();
        }
    });

    let output = execute(&cli, &config, cancellation).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Run `cli`'s command and return its JSON result.
pub async fn execute(
    cli: &Cli,
    config: &Config,
    cancellation: CancellationToken,
) -> Result<serde_json::Value> {
    debug!(command = ?cli.command, "Executing");
    match &cli.command {
        Command::Adjust(args) => commands::adjust(args, config).await,
        Command::Query(args) => commands::query(args, config, cancellation).await,
        Command::Uploads(args) => commands::uploads(args, config, cancellation).await,
    }
}

/// `RUST_LOG` wins over the configured filter.
fn init_logging(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter));
    // Fails only if a subscriber is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
