//! Unit-of-work sessions and the transactional scope around them.
//!
//! # Responsibility
//! - Bracket a sequence of repository calls in one SQLite transaction.
//! - Commit when the scoped work succeeds, roll back when it fails, and
//!   release the unit-of-work on every exit path.
//!
//! # Invariants
//! - Lifecycle is `Open -> (Committed | RolledBack)* -> Closed`; the state
//!   records the last settle, and each settle opens the next transaction.
//! - No write runs outside a transaction while the session is not closed.
//! - Commit is attempted only when the work returned `Ok`.
//! - The work's error is returned unchanged after rollback.
//! - `close` takes effect once; closing an open session discards its changes.

mod scope;
mod unit;

pub use scope::run_scoped;
pub use unit::Session;

/// Lifecycle position of a unit-of-work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Committed,
    RolledBack,
    Closed,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
            Self::Closed => "closed",
        }
    }
}

/// A bounded sequence of staged changes, committed or discarded atomically.
pub trait UnitOfWork {
    type Error;

    fn state(&self) -> SessionState;
    /// Makes every staged change durable and starts staging anew.
    fn commit(&mut self) -> Result<(), Self::Error>;
    /// Discards every staged change and starts staging anew.
    fn rollback(&mut self) -> Result<(), Self::Error>;
    /// Releases the underlying resource. Repeated calls are no-ops.
    fn close(&mut self);
}
