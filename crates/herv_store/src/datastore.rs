//! Locating the results database under a base directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::{HervConfig, HervError, HervResult, HervStore};

const DEFAULT_DB_NAME: &str = "herv.sqlite";

pub fn default_sqlite_path(base: &Path) -> PathBuf {
    base.join(DEFAULT_DB_NAME)
}

/// Reads `herv.json` under `base`, writing a SQLite default on first use.
pub fn load_or_init_config(base: &Path) -> HervResult<HervConfig> {
    HervConfig::load_or_init(base, &default_sqlite_path(base))
}

/// Resolves the SQLite file for `config` and makes sure it can be created.
///
/// Missing parent directories are created. A path naming an existing
/// directory is a configuration error rather than a storage failure at
/// connect time.
pub fn prepare_sqlite_file(config: &HervConfig, base: &Path) -> HervResult<PathBuf> {
    let path = config.sqlite_path(base)?;
    if path.is_dir() {
        return Err(HervError::config(format!(
            "sqlite path {} is a directory",
            path.display()
        )));
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            HervError::storage(format!("create database dir {}: {err}", parent.display()))
        })?;
    }
    Ok(path)
}

pub async fn open_store(base: &Path) -> HervResult<HervStore> {
    let config = load_or_init_config(base)?;
    HervStore::connect(&config, base).await
}

#[cfg(test)]
mod tests {
    use super::{default_sqlite_path, load_or_init_config, open_store, prepare_sqlite_file};
    use crate::{HervConfig, HervError};
    use tempfile::tempdir;

    #[tokio::test]
    async fn opens_store_with_default_config() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path();
        let config = load_or_init_config(base).expect("config");
        assert_eq!(config.backend_name(), "sqlite");
        let store = open_store(base).await.expect("open store");
        assert!(default_sqlite_path(base).exists());
        assert!(base.join("herv.json").exists());
        drop(store);
    }

    #[test]
    fn nested_relative_path_gets_its_directories() {
        let dir = tempdir().expect("tempdir");
        let config = HervConfig::default_sqlite("runs/2024/scan.sqlite");
        let path = prepare_sqlite_file(&config, dir.path()).expect("prepared");
        assert_eq!(path, dir.path().join("runs/2024/scan.sqlite"));
        assert!(dir.path().join("runs/2024").is_dir());
        assert!(!path.exists());
    }

    #[test]
    fn directory_is_not_a_database_file() {
        let dir = tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("scan.sqlite")).expect("mkdir");
        let config = HervConfig::default_sqlite("scan.sqlite");
        let err = prepare_sqlite_file(&config, dir.path()).expect_err("directory");
        assert!(matches!(err, HervError::Config { .. }));
    }

    #[test]
    fn server_backends_have_no_file() {
        let dir = tempdir().expect("tempdir");
        let mut config = HervConfig::default_sqlite("unused.sqlite");
        config.database = crate::DatabaseConfig::Postgres {
            url: "postgres://scan@localhost/herv".to_string(),
        };
        let err = prepare_sqlite_file(&config, dir.path()).expect_err("not sqlite");
        assert!(matches!(err, HervError::Config { .. }));
    }
}
