//! Scoped execution of work against a unit-of-work.

use super::UnitOfWork;
use log::warn;
use std::fmt::Display;

/// Closes the wrapped unit-of-work when dropped, including during unwinding.
struct CloseGuard<U: UnitOfWork> {
    unit: U,
}

impl<U: UnitOfWork> Drop for CloseGuard<U> {
    fn drop(&mut self) {
        self.unit.close();
    }
}

/// Runs `work` inside `unit` and settles the unit afterwards.
///
/// - `Ok`: commits, then returns the value. A commit failure is returned as is.
/// - `Err`: rolls back, then returns the work's error unchanged. A rollback
///   failure is logged and does not replace that error.
/// - Always closes `unit` exactly once, also when `work` panics.
pub fn run_scoped<U, T, E, W>(unit: U, work: W) -> Result<T, E>
where
    U: UnitOfWork,
    U::Error: Display,
    E: From<U::Error>,
    W: FnOnce(&mut U) -> Result<T, E>,
{
    let mut guard = CloseGuard { unit };
    match work(&mut guard.unit) {
        Ok(value) => {
            guard.unit.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = guard.unit.rollback() {
                warn!(
                    "event=session_rollback module=session status=error error_code=rollback_failed error={}",
                    rollback_err
                );
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::run_scoped;
    use crate::session::{SessionState, UnitOfWork};
    use std::cell::RefCell;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Calls {
        commits: u32,
        rollbacks: u32,
        closes: u32,
    }

    #[derive(Debug, PartialEq, Eq)]
    enum Fault {
        Store(&'static str),
        Work(&'static str),
    }

    impl From<&'static str> for Fault {
        fn from(value: &'static str) -> Self {
            Self::Store(value)
        }
    }

    struct Recording {
        calls: Rc<RefCell<Calls>>,
        state: SessionState,
        fail_commit: bool,
    }

    impl Recording {
        fn new(calls: &Rc<RefCell<Calls>>) -> Self {
            Self {
                calls: Rc::clone(calls),
                state: SessionState::Open,
                fail_commit: false,
            }
        }
    }

    impl UnitOfWork for Recording {
        type Error = &'static str;

        fn state(&self) -> SessionState {
            self.state
        }

        fn commit(&mut self) -> Result<(), Self::Error> {
            self.calls.borrow_mut().commits += 1;
            if self.fail_commit {
                return Err("disk full");
            }
            self.state = SessionState::Committed;
            Ok(())
        }

        fn rollback(&mut self) -> Result<(), Self::Error> {
            self.calls.borrow_mut().rollbacks += 1;
            self.state = SessionState::RolledBack;
            Ok(())
        }

        fn close(&mut self) {
            if self.state == SessionState::Closed {
                return;
            }
            self.calls.borrow_mut().closes += 1;
            self.state = SessionState::Closed;
        }
    }

    #[test]
    fn success_commits_once_and_closes_once() {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let result: Result<u32, Fault> = run_scoped(Recording::new(&calls), |unit| {
            assert_eq!(unit.state(), SessionState::Open);
            Ok(42)
        });

        assert_eq!(result, Ok(42));
        let calls = calls.borrow();
        assert_eq!((calls.commits, calls.rollbacks, calls.closes), (1, 0, 1));
    }

    #[test]
    fn failure_rolls_back_once_and_returns_same_error() {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let result: Result<u32, Fault> =
            run_scoped(Recording::new(&calls), |_| Err(Fault::Work("boom")));

        assert_eq!(result, Err(Fault::Work("boom")));
        let calls = calls.borrow();
        assert_eq!((calls.commits, calls.rollbacks, calls.closes), (0, 1, 1));
    }

    #[test]
    fn commit_failure_propagates_without_rollback() {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let mut unit = Recording::new(&calls);
        unit.fail_commit = true;

        let result: Result<u32, Fault> = run_scoped(unit, |_| Ok(1));

        assert_eq!(result, Err(Fault::Store("disk full")));
        let calls = calls.borrow();
        assert_eq!((calls.commits, calls.rollbacks, calls.closes), (1, 0, 1));
    }

    #[test]
    fn panic_in_work_still_closes() {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let unit = Recording::new(&calls);

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let _: Result<u32, Fault> = run_scoped(unit, |_| panic!("runtime fault"));
        }));

        assert!(outcome.is_err());
        let calls = calls.borrow();
        assert_eq!((calls.commits, calls.rollbacks, calls.closes), (0, 0, 1));
    }
}
