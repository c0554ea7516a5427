//! Scoped transactions: begin, commit or roll back, and always close.

use crate::error::{TxError, TxResult};
use crate::session::Session;

/// A transaction opened on a borrowed session.
///
/// Finish it with [`commit`](Self::commit) or [`rollback`](Self::rollback);
/// both close the session afterwards, whatever the outcome. If the scope is
/// dropped unfinished (an early return, or a panic unwinding through the work)
/// it rolls back and closes on its own.
///
/// Most callers want [`session_scope`], which drives a closure through this
/// type.
pub struct ScopedTransaction<'s, S: Session + ?Sized> {
  session: &'s mut S,
  finished: bool,
}

impl<'s, S: Session + ?Sized> ScopedTransaction<'s, S> {
  /// Calls `begin()` on the session. If that fails nothing else is called.
  pub fn begin(session: &'s mut S) -> TxResult<Self> {
    session.begin()?;
    Ok(Self {
      session,
      finished: false,
    })
  }

  /// The session the transaction runs on.
  pub fn session(&mut self) -> &mut S {
    &mut *self.session
  }

  /// Commits, then closes. If the commit fails the transaction is rolled back
  /// before closing and the commit error is returned.
  pub fn commit(mut self) -> TxResult<()> {
    self.finished = true;
    if let Err(commit_err) = self.session.commit() {
      if let Err(e) = self.session.rollback() {
        log::error!("Rollback after failed commit failed: {}", e);
      }
      if let Err(e) = self.session.close() {
        log::error!("Closing session after failed commit failed: {}", e);
      }
      return Err(commit_err);
    }
    self.session.close()
  }

  /// Rolls back, then closes. Errors from either are logged and the first one
  /// is returned.
  pub fn rollback(mut self) -> TxResult<()> {
    self.finished = true;
    let rolled_back = self.session.rollback();
    if let Err(e) = &rolled_back {
      log::error!("Rollback of scoped transaction failed: {}", e);
    }
    let closed = self.session.close();
    if let Err(e) = &closed {
      log::error!("Closing session after rollback failed: {}", e);
    }
    rolled_back.and(closed)
  }
}

impl<S: Session + ?Sized> Drop for ScopedTransaction<'_, S> {
  fn drop(&mut self) {
    if self.finished {
      return;
    }
    log::warn!("ScopedTransaction dropped without commit or rollback. Rolling back.");
    if let Err(e) = self.session.rollback() {
      log::error!("Auto-rollback of scoped transaction failed: {}", e);
    }
    if let Err(e) = self.session.close() {
      log::error!("Closing session after auto-rollback failed: {}", e);
    }
  }
}

/// Runs `work` inside a transaction on `session`.
///
/// The session sees `begin → commit → close` when `work` succeeds and
/// `begin → rollback → close` when it fails. The error of `work` is returned
/// as is; a failing rollback or close never replaces it. A failing close
/// after a successful commit is returned.
pub fn session_scope<S, F, T, E>(session: &mut S, work: F) -> Result<T, E>
where
  S: Session + ?Sized,
  F: FnOnce(&mut S) -> Result<T, E>,
  E: From<TxError>,
{
  let mut scope = ScopedTransaction::begin(session)?;
  match work(scope.session()) {
    Ok(value) => {
      scope.commit()?;
      Ok(value)
    }
    Err(err) => {
      // Already logged; the caller needs the original error.
      let _ = scope.rollback();
      Err(err)
    }
  }
}
