//! Layering tests for `Config::load`.

use std::path::PathBuf;

use codenav_config::{Config, ConfigError};
use serial_test::serial;
use tempfile::TempDir;

fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
#[serial]
fn test_file_overrides_defaults() {
    let (_dir, path) = write_config(
        r#"
[query]
references_page_size = 25

[git]
binary = "/usr/local/bin/git"

[git.repositories]
42 = "/srv/repos/sourcegraph"
"#,
    );

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.query.references_page_size, 25);
    // Untouched keys keep their defaults.
    assert_eq!(config.query.diagnostics_page_size, 100);
    assert_eq!(config.log.filter, "codenav=info");
    assert_eq!(config.git.binary, "/usr/local/bin/git");
    assert_eq!(
        config.git.repository_paths().unwrap(),
        vec![(42, PathBuf::from("/srv/repos/sourcegraph"))]
    );
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    let (_dir, path) = write_config("[query]\nreferences_page_size = 25\n");

    std::env::set_var("CODENAV_QUERY__REFERENCES_PAGE_SIZE", "7");
    std::env::set_var("CODENAV_LOG__FILTER", "codenav=trace");
    let result = Config::load(Some(&path));
    std::env::remove_var("CODENAV_QUERY__REFERENCES_PAGE_SIZE");
    std::env::remove_var("CODENAV_LOG__FILTER");

    let config = result.unwrap();
    assert_eq!(config.query.references_page_size, 7);
    assert_eq!(config.log.filter, "codenav=trace");
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(matches!(
        Config::load(Some(&missing)),
        Err(ConfigError::Load(_))
    ));
}

#[test]
#[serial]
fn test_invalid_page_size_is_rejected() {
    let (_dir, path) = write_config("[query]\ndiagnostics_page_size = 0\n");
    assert!(matches!(
        Config::load(Some(&path)),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
#[serial]
fn test_tilde_in_repository_path_is_expanded() {
    let Some(home) = dirs::home_dir() else {
        return;
    };
    let (_dir, path) = write_config("[git.repositories]\n7 = \"~/checkouts/seven\"\n");

    let config = Config::load(Some(&path)).unwrap();
    let paths = config.git.repository_paths().unwrap();
    assert_eq!(paths, vec![(7, home.join("checkouts/seven"))]);
}
