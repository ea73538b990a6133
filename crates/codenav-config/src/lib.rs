//! Configuration for codenav.
//!
//! Values are layered, later sources overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`--config <path>`, or `<config dir>/codenav/config.toml`
//!    when present)
//! 3. `CODENAV_` environment variables, with `__` separating nested keys
//!    (e.g. `CODENAV_QUERY__REFERENCES_PAGE_SIZE=50`)
//!
//! ```toml
//! [query]
//! references_page_size = 100
//! diagnostics_page_size = 100
//!
//! [git]
//! binary = "git"
//!
//! [git.repositories]
//! 42 = "~/src/sourcegraph"
//!
//! [log]
//! filter = "codenav=info"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use codenav_core::{DEFAULT_DIAGNOSTICS_PAGE_SIZE, DEFAULT_REFERENCES_PAGE_SIZE};

/// Default tracing filter directive.
pub const DEFAULT_LOG_FILTER: &str = "codenav=info";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "CODENAV";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value was read but is not acceptable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Paging defaults for query operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Page size for references when the caller gives none.
    #[serde(default = "default_references_page_size")]
    pub references_page_size: i32,
    /// Page size for diagnostics when the caller gives none.
    #[serde(default = "default_diagnostics_page_size")]
    pub diagnostics_page_size: i32,
}

fn default_references_page_size() -> i32 {
    DEFAULT_REFERENCES_PAGE_SIZE
}

fn default_diagnostics_page_size() -> i32 {
    DEFAULT_DIAGNOSTICS_PAGE_SIZE
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            references_page_size: DEFAULT_REFERENCES_PAGE_SIZE,
            diagnostics_page_size: DEFAULT_DIAGNOSTICS_PAGE_SIZE,
        }
    }
}

/// Where and how to run git.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    /// Git executable.
    #[serde(default = "default_git_binary")]
    pub binary: String,
    /// Local checkout per repository id. Keys are repository ids.
    #[serde(default)]
    pub repositories: HashMap<String, String>,
}

fn default_git_binary() -> String {
    "git".to_string()
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            binary: default_git_binary(),
            repositories: HashMap::new(),
        }
    }
}

impl GitConfig {
    /// Repository checkouts keyed by numeric id, with `~` and `$VAR` expanded.
    pub fn repository_paths(&self) -> Result<Vec<(i64, PathBuf)>, ConfigError> {
        let mut paths = Vec::with_capacity(self.repositories.len());
        for (key, path) in &self.repositories {
            let id = key.parse::<i64>().map_err(|_| {
                ConfigError::Invalid(format!("repository id must be an integer, got {:?}", key))
            })?;
            let expanded = shellexpand::full(path)
                .map_err(|e| ConfigError::Invalid(format!("cannot expand {:?}: {}", path, e)))?;
            paths.push((id, PathBuf::from(expanded.as_ref())));
        }
        paths.sort_by_key(|(id, _)| *id);
        Ok(paths)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, a file and the environment.
    ///
    /// An explicit `path` must exist; the default per-user file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("query.references_page_size", DEFAULT_REFERENCES_PAGE_SIZE as i64)?
            .set_default("query.diagnostics_page_size", DEFAULT_DIAGNOSTICS_PAGE_SIZE as i64)?
            .set_default("git.binary", default_git_binary())?
            .set_default("log.filter", DEFAULT_LOG_FILTER)?;

        match path {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration file");
                builder = builder.add_source(config::File::from(path).required(true));
            }
            None => {
                if let Some(default_path) = default_config_path() {
                    builder = builder.add_source(config::File::from(default_path).required(false));
                }
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every query fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query.references_page_size <= 0 {
            return Err(ConfigError::Invalid(format!(
                "query.references_page_size must be positive, got {}",
                self.query.references_page_size
            )));
        }
        if self.query.diagnostics_page_size <= 0 {
            return Err(ConfigError::Invalid(format!(
                "query.diagnostics_page_size must be positive, got {}",
                self.query.diagnostics_page_size
            )));
        }
        if self.git.binary.trim().is_empty() {
            return Err(ConfigError::Invalid("git.binary must not be empty".to_string()));
        }
        Ok(())
    }

    /// Set the default references page size.
    pub fn with_references_page_size(mut self, size: i32) -> Self {
        self.query.references_page_size = size;
        self
    }

    /// Set the default diagnostics page size.
    pub fn with_diagnostics_page_size(mut self, size: i32) -> Self {
        self.query.diagnostics_page_size = size;
        self
    }

    /// Register a repository checkout.
    pub fn with_repository(mut self, id: i64, path: impl Into<String>) -> Self {
        self.git.repositories.insert(id.to_string(), path.into());
        self
    }
}

/// `<config dir>/codenav/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("codenav").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.query.references_page_size, 100);
        assert_eq!(config.query.diagnostics_page_size, 100);
        assert_eq!(config.git.binary, "git");
        assert_eq!(config.log.filter, "codenav=info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_page_size_defaults_follow_query_connection() {
        let query = QueryConfig::default();
        assert_eq!(
            query.references_page_size,
            codenav_core::DEFAULT_REFERENCES_PAGE_SIZE
        );
        assert_eq!(
            query.diagnostics_page_size,
            codenav_core::DEFAULT_DIAGNOSTICS_PAGE_SIZE
        );
    }

    #[test]
    fn test_builder() {
        let config = Config::default()
            .with_references_page_size(25)
            .with_diagnostics_page_size(10)
            .with_repository(42, "/srv/repos/42");
        assert_eq!(config.query.references_page_size, 25);
        assert_eq!(config.query.diagnostics_page_size, 10);
        assert_eq!(
            config.git.repository_paths().unwrap(),
            vec![(42, PathBuf::from("/srv/repos/42"))]
        );
    }

    #[test]
    fn test_validate_rejects_non_positive_page_size() {
        let config = Config::default().with_references_page_size(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = Config::default().with_diagnostics_page_size(-3);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_repository_ids_must_be_numeric() {
        let mut config = Config::default();
        config
            .git
            .repositories
            .insert("github.com/foo/bar".to_string(), "/tmp".to_string());
        assert!(matches!(
            config.git.repository_paths(),
            Err(ConfigError::Invalid(_))
        ));
    }
}
