//! Replaying units of work that lose a write conflict.
//!
//! A [`RetryingTransaction`] runs a unit of work against a receiver whose
//! session it finds through [`HasSession`]. When the work fails with an error
//! its classifier calls a transient conflict, the session is closed, the
//! transaction restarted, and the work replayed from scratch, up to the
//! policy's budget. Any other failure rolls the session back, restarts its
//! transaction, and is returned unchanged.
//!
//! Because a replay runs the whole unit of work again, keep it small and free
//! of external side effects, and never swallow the errors it gets from the
//! database.

pub mod classify;
pub mod policy;
pub mod sink;

pub use classify::{classify_kind, ConflictClassifier, ErrorClass, RocksDbConflictClassifier};
pub use policy::{default_max_retries, RetryPolicy, DEFAULT_MAX_CONFLICT_RETRIES, RETRY_DELAY};
pub use sink::{LogTarget, RetryLogger};

use crate::error::TxError;
use crate::session::{resolve_session, HasSession, Session};
use std::error::Error as StdError;
use std::thread;
use std::time::Duration;

const RETRY_MESSAGE: &str = "Retrying transaction - db conflict occurred";

/// The outcome of one attempt, as the driving loop sees it.
enum Attempt<T, E> {
  Success(T),
  Conflict(E),
  Fatal(E),
}

/// Runs units of work under a [`RetryPolicy`], replaying them on transient
/// conflicts as decided by a [`ConflictClassifier`].
#[derive(Debug, Clone)]
pub struct RetryingTransaction<C = RocksDbConflictClassifier> {
  policy: RetryPolicy,
  classifier: C,
}

impl Default for RetryingTransaction {
  fn default() -> Self {
    Self::new(RetryPolicy::default())
  }
}

impl RetryingTransaction {
  pub fn new(policy: RetryPolicy) -> Self {
    Self {
      policy,
      classifier: RocksDbConflictClassifier,
    }
  }
}

impl<C> RetryingTransaction<C> {
  /// Swaps the classifier, e.g. for an application error type.
  pub fn with_classifier<NC>(self, classifier: NC) -> RetryingTransaction<NC> {
    RetryingTransaction {
      policy: self.policy,
      classifier,
    }
  }

  pub fn policy(&self) -> &RetryPolicy {
    &self.policy
  }

  fn attempt<T, E>(&self, result: Result<T, E>) -> Attempt<T, E>
  where
    C: ConflictClassifier<E>,
  {
    match result {
      Ok(value) => Attempt::Success(value),
      Err(err) => match self.classifier.classify(&err) {
        ErrorClass::TransientConflict => Attempt::Conflict(err),
        ErrorClass::NonTransient | ErrorClass::Fatal => Attempt::Fatal(err),
      },
    }
  }

  fn pause(&self, attempt: usize) {
    if self.policy.delay > Duration::ZERO {
      thread::sleep(self.policy.delay);
    }
    if let Some(logger) = &self.policy.logger {
      logger.debug(RETRY_MESSAGE, attempt);
    }
  }

  /// Runs `operation` on `receiver`, replaying it on transient conflicts.
  ///
  /// `function` names the unit of work in the error reported when the budget
  /// runs out.
  ///
  /// # Errors
  /// - [`TxError::InvalidUsage`] if the receiver has no session. Nothing is
  ///   called in that case.
  /// - [`TxError::UnresolvedConflict`] once `max_retries` replays have all
  ///   conflicted. Its source is the last conflict.
  /// - the operation's own error, unchanged, for anything not retried.
  /// - a session error if closing or restarting the session between attempts
  ///   fails. The conflict that led there is logged at error level.
  pub fn run<R, F, T, E>(&self, function: &str, receiver: &mut R, mut operation: F) -> Result<T, E>
  where
    R: HasSession + ?Sized,
    F: FnMut(&mut R) -> Result<T, E>,
    C: ConflictClassifier<E>,
    E: From<TxError> + StdError + Send + Sync + 'static,
  {
    resolve_session(&mut *receiver)?;

    let mut attempts = 0usize;
    loop {
      match self.attempt(operation(&mut *receiver)) {
        Attempt::Success(value) => return Ok(value),
        Attempt::Conflict(err) => {
          attempts += 1;
          let session = resolve_session(&mut *receiver)?;
          if let Err(e) = session.close() {
            log::error!(
              "Closing session after conflict in {} on attempt {} failed: {} (conflict: {})",
              function,
              attempts,
              e,
              err
            );
            return Err(E::from(e));
          }

          if attempts > self.policy.max_retries {
            log::warn!(
              "Giving up on {} after {} attempts: {}",
              function,
              attempts,
              err
            );
            return Err(E::from(TxError::UnresolvedConflict {
              function: function.to_string(),
              retries: self.policy.max_retries,
              attempts,
              source: Box::new(err),
            }));
          }

          log::trace!("{} hit a write conflict on attempt {}: {}", function, attempts, err);
          self.pause(attempts);
          if let Err(e) = session.begin() {
            log::error!(
              "Restarting transaction after conflict in {} on attempt {} failed: {} (conflict: {})",
              function,
              attempts,
              e,
              err
            );
            return Err(E::from(e));
          }
        }
        Attempt::Fatal(err) => {
          let session = resolve_session(&mut *receiver)?;
          restart(session);
          return Err(err);
        }
      }
    }
  }

  /// Turns `operation` into a callable that applies this policy on every
  /// call. The arguments are lent unchanged to each attempt.
  pub fn wrap<R, A, F, T, E>(self, function: impl Into<String>, mut operation: F) -> impl FnMut(&mut R, A) -> Result<T, E>
  where
    R: HasSession + ?Sized,
    F: FnMut(&mut R, &A) -> Result<T, E>,
    C: ConflictClassifier<E>,
    E: From<TxError> + StdError + Send + Sync + 'static,
  {
    let function = function.into();
    move |receiver: &mut R, args: A| self.run(&function, receiver, |r| operation(r, &args))
  }
}

/// Rolls back and begins again so the receiver's session stays usable. This is
/// best effort: the caller is about to return a more relevant error.
fn restart<S: Session + ?Sized>(session: &mut S) {
  if let Err(e) = session.rollback() {
    log::error!("Rollback after failed unit of work failed: {}", e);
  }
  if let Err(e) = session.begin() {
    log::error!("Restarting transaction after failed unit of work failed: {}", e);
  }
}

/// Shorthand for `RetryingTransaction::new(policy).run(function, receiver, operation)`.
pub fn with_retry<R, F, T>(policy: RetryPolicy, function: &str, receiver: &mut R, operation: F) -> Result<T, TxError>
where
  R: HasSession + ?Sized,
  F: FnMut(&mut R) -> Result<T, TxError>,
{
  RetryingTransaction::new(policy).run(function, receiver, operation)
}
