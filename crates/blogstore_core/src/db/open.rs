//! Store bootstrap for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections from a `StoreConfig`.
//! - Configure connection pragmas required by core behavior.
//! - Run `create_all` before returning a usable store.
//!
//! # Invariants
//! - Returned stores have `foreign_keys=ON`.
//! - Returned stores have every declared table created.

use super::config::{StoreConfig, StoreLocation};
use super::schema::create_all;
use super::{DbError, DbResult};
use crate::session::{run_scoped, Session};
use log::{debug, error, info};
use rusqlite::Connection;
use std::time::Instant;

/// Opened backing store; the factory for unit-of-work sessions.
pub struct Store {
    conn: Connection,
    config: StoreConfig,
}

impl Store {
    /// Opens the configured database and creates all declared tables.
    ///
    /// # Side effects
    /// - Emits `store_open` logging events with duration and status.
    pub fn open(config: &StoreConfig) -> DbResult<Self> {
        let started_at = Instant::now();
        let mode = config.mode();
        info!("event=store_open module=db status=start mode={mode}");

        let opened = match &config.location {
            StoreLocation::Memory => Connection::open_in_memory(),
            StoreLocation::File(path) => Connection::open(path),
        };
        let mut conn = match opened {
            Ok(conn) => conn,
            Err(err) => {
                error!(
                    "event=store_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                    mode,
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        match bootstrap_connection(&mut conn, config) {
            Ok(()) => {
                info!(
                    "event=store_open module=db status=ok mode={} echo={} duration_ms={}",
                    mode,
                    config.echo,
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    conn,
                    config: config.clone(),
                })
            }
            Err(err) => {
                error!(
                    "event=store_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                    mode,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Re-runs `create_all`; a no-op when every table already exists.
    pub fn create_all(&mut self) -> DbResult<()> {
        create_all(&mut self.conn)
    }

    /// Starts a fresh unit-of-work on this store.
    pub fn begin(&mut self) -> DbResult<Session<'_>> {
        Session::begin(&mut self.conn)
    }

    /// Runs `work` in a fresh unit-of-work.
    ///
    /// Commits when `work` returns `Ok`, rolls back and returns the same
    /// error when it returns `Err`, and releases the session on every path.
    /// Failures to begin or commit reach the caller through `E: From<DbError>`.
    pub fn session_scope<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        E: From<DbError>,
        F: FnOnce(&mut Session<'_>) -> Result<T, E>,
    {
        let session = self.begin()?;
        run_scoped(session, work)
    }

    /// Read access outside any unit-of-work, e.g. to inspect committed state.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn bootstrap_connection(conn: &mut Connection, config: &StoreConfig) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(config.busy_timeout)?;
    if config.echo {
        conn.trace(Some(echo_statement));
    }
    create_all(conn)?;
    Ok(())
}

fn echo_statement(sql: &str) {
    debug!("event=sql_echo module=db sql={}", sql.replace(['\n', '\r'], " "));
}
