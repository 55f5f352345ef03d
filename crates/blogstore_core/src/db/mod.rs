//! SQLite storage bootstrap and schema entry points.
//!
//! # Responsibility
//! - Hold the explicit store configuration passed to whoever opens the store.
//! - Open and configure SQLite connections for blogstore core.
//! - Materialize the declared schema (`create_all`) before any data access.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write application data before `create_all` succeeds.
//! - There is no process-wide store; every `Store` is built from a `StoreConfig`.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod config;
mod open;
pub mod schema;

pub use config::{StoreConfig, StoreLocation, DATABASE_URL_ENV, ECHO_ENV};
pub use open::Store;
pub use schema::{cascade_dependents, create_all, latest_version};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    Config(String),
    /// Commit or rollback requested on a closed session.
    SessionNotOpen {
        state: &'static str,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Config(message) => write!(f, "invalid store configuration: {message}"),
            Self::SessionNotOpen { state } => write!(f, "session is not open (state: {state})"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
            Self::Config(_) => None,
            Self::SessionNotOpen { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
