//! Store configuration.
//!
//! # Responsibility
//! - Describe where the backing store lives and how connections are tuned.
//! - Load configuration from `sqlite://` URLs or the process environment.
//!
//! # Invariants
//! - Built once at process start and passed by reference; never global.
//! - File paths are handed to SQLite as-is and not validated here.

use super::{DbError, DbResult};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the store URL.
pub const DATABASE_URL_ENV: &str = "BLOGSTORE_DATABASE_URL";
/// Environment variable enabling SQL echo (`1` or `true`).
pub const ECHO_ENV: &str = "BLOGSTORE_ECHO";

const SQLITE_SCHEME: &str = "sqlite://";
const MEMORY_PATH: &str = ":memory:";
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
});

/// Location of the backing SQLite database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Private in-memory database, gone when the store is dropped.
    Memory,
    /// Database file on disk.
    File(PathBuf),
}

/// Explicit store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub location: StoreLocation,
    /// Log every executed SQL statement at `debug` level.
    pub echo: bool,
    pub busy_timeout: Duration,
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            echo: false,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            location: StoreLocation::File(path.as_ref().to_path_buf()),
            ..Self::in_memory()
        }
    }

    /// Returns a copy with SQL echo switched on or off.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Parses a `sqlite://` URL.
    ///
    /// - `sqlite://` and `sqlite:///:memory:` map to an in-memory store.
    /// - `sqlite:///blog.db` maps to the relative file `blog.db`.
    /// - `sqlite:////var/lib/blog.db` maps to the file `/var/lib/blog.db`.
    ///
    /// # Errors
    /// - Returns `DbError::Config` for any other scheme, or for a host part
    ///   such as `sqlite://blog.db`.
    pub fn from_database_url(url: &str) -> DbResult<Self> {
        let trimmed = url.trim();
        let rest = trimmed.strip_prefix(SQLITE_SCHEME).ok_or_else(|| {
            DbError::Config(format!(
                "unsupported database url `{trimmed}`; expected `{SQLITE_SCHEME}...`"
            ))
        })?;

        let path = match rest.strip_prefix('/') {
            Some(path) => path,
            None if rest.is_empty() || rest == MEMORY_PATH => "",
            None => {
                return Err(DbError::Config(format!(
                    "database url `{trimmed}` has a host part; use `{SQLITE_SCHEME}/<path>`"
                )));
            }
        };

        if path.is_empty() || path == MEMORY_PATH {
            return Ok(Self::in_memory());
        }
        Ok(Self::file(path))
    }

    /// Loads configuration from the environment, reading `.env` once.
    ///
    /// Falls back to an in-memory store when no URL is set.
    pub fn from_env() -> DbResult<Self> {
        Lazy::force(&DOTENV_LOADED);
        let config = match std::env::var(DATABASE_URL_ENV) {
            Ok(url) => Self::from_database_url(&url)?,
            Err(_) => Self::in_memory(),
        };
        let echo = std::env::var(ECHO_ENV)
            .map(|value| parse_flag(&value))
            .unwrap_or(false);
        Ok(config.with_echo(echo))
    }

    /// Short label used in log events.
    pub(crate) fn mode(&self) -> &'static str {
        match self.location {
            StoreLocation::Memory => "memory",
            StoreLocation::File(_) => "file",
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::{parse_flag, StoreConfig, StoreLocation};
    use crate::db::DbError;
    use std::path::PathBuf;

    #[test]
    fn memory_urls_map_to_memory() {
        for url in ["sqlite://", "sqlite:///:memory:", "sqlite://:memory:"] {
            let config = StoreConfig::from_database_url(url).unwrap();
            assert_eq!(config.location, StoreLocation::Memory, "url {url}");
        }
    }

    #[test]
    fn three_slashes_are_relative_and_four_are_absolute() {
        let relative = StoreConfig::from_database_url("sqlite:///blog.db").unwrap();
        assert_eq!(relative.location, StoreLocation::File(PathBuf::from("blog.db")));

        let nested = StoreConfig::from_database_url("sqlite:///data/blog.db").unwrap();
        assert_eq!(nested.location, StoreLocation::File(PathBuf::from("data/blog.db")));

        let absolute = StoreConfig::from_database_url("sqlite:////var/lib/blog.db").unwrap();
        assert_eq!(
            absolute.location,
            StoreLocation::File(PathBuf::from("/var/lib/blog.db"))
        );
    }

    #[test]
    fn host_part_is_rejected() {
        let err = StoreConfig::from_database_url("sqlite://blog.db").unwrap_err();
        assert!(matches!(err, DbError::Config(message) if message.contains("host part")));
    }

    #[test]
    fn non_sqlite_scheme_is_rejected() {
        let err = StoreConfig::from_database_url("postgres://localhost/blog").unwrap_err();
        assert!(matches!(err, DbError::Config(message) if message.contains("postgres")));
    }

    #[test]
    fn echo_flag_parsing() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" TRUE "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("nope"));
    }
}
