//! SQLite-backed unit-of-work.

use super::{SessionState, UnitOfWork};
use crate::db::{DbError, DbResult};
use crate::repo::post_repo::SqlitePostRepository;
use crate::repo::user_repo::SqliteUserRepository;
use log::{debug, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::time::Instant;

/// One SQLite transaction at a time plus the repositories bound to it.
///
/// Holding the store connection exclusively for its lifetime keeps staged
/// changes invisible to anyone else until commit. Every `commit` or
/// `rollback` immediately opens the next transaction, so writes made after
/// a manual settle are still staged until the next settle.
pub struct Session<'conn> {
    conn: &'conn Connection,
    tx: Option<Transaction<'conn>>,
    state: SessionState,
    started_at: Instant,
}

impl<'conn> Session<'conn> {
    /// Opens a deferred transaction on `conn`.
    pub(crate) fn begin(conn: &'conn mut Connection) -> DbResult<Self> {
        let conn: &'conn Connection = conn;
        let tx = begin_deferred(conn)?;
        debug!("event=session_begin module=session status=ok");
        Ok(Self {
            conn,
            tx: Some(tx),
            state: SessionState::Open,
            started_at: Instant::now(),
        })
    }

    pub fn users(&self) -> SqliteUserRepository<'_> {
        SqliteUserRepository::new(self.conn)
    }

    pub fn posts(&self) -> SqlitePostRepository<'_> {
        SqlitePostRepository::new(self.conn)
    }

    /// Raw access for queries the repositories do not cover.
    pub fn connection(&self) -> &Connection {
        self.conn
    }

    fn settle(&mut self, outcome: SessionState) -> DbResult<()> {
        if self.state == SessionState::Closed {
            return Err(DbError::SessionNotOpen {
                state: self.state.as_str(),
            });
        }

        let settled = match self.tx.take() {
            Some(tx) if outcome == SessionState::Committed => tx.commit(),
            // `finish` tolerates a transaction SQLite already ended.
            Some(tx) => tx.finish(),
            None => Ok(()),
        };
        // A failed commit drops its transaction, which rolls it back.
        self.state = if settled.is_ok() {
            outcome
        } else {
            SessionState::RolledBack
        };

        match begin_deferred(self.conn) {
            Ok(tx) => self.tx = Some(tx),
            Err(err) => {
                warn!(
                    "event=session_begin module=session status=error error_code=reopen_failed error={}",
                    err
                );
                self.state = SessionState::Closed;
                settled?;
                return Err(err);
            }
        }
        settled?;
        Ok(())
    }
}

fn begin_deferred(conn: &Connection) -> DbResult<Transaction<'_>> {
    Ok(Transaction::new_unchecked(conn, TransactionBehavior::Deferred)?)
}

impl UnitOfWork for Session<'_> {
    type Error = DbError;

    fn state(&self) -> SessionState {
        self.state
    }

    fn commit(&mut self) -> DbResult<()> {
        self.settle(SessionState::Committed)?;
        info!(
            "event=session_commit module=session status=ok duration_ms={}",
            self.started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn rollback(&mut self) -> DbResult<()> {
        self.settle(SessionState::RolledBack)?;
        info!(
            "event=session_rollback module=session status=ok duration_ms={}",
            self.started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if let Some(tx) = self.tx.take() {
            if let Err(err) = tx.finish() {
                warn!(
                    "event=session_close module=session status=error error_code=discard_failed error={}",
                    err
                );
            }
        }
        if self.state == SessionState::Open {
            info!("event=session_close module=session status=ok discarded=true");
        } else {
            debug!(
                "event=session_close module=session status=ok outcome={}",
                self.state.as_str()
            );
        }
        self.state = SessionState::Closed;
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.close();
    }
}
