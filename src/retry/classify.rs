//! Deciding which failures are worth replaying.

use crate::error::TxError;
use rocksdb::ErrorKind;

/// How a failed attempt is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
  /// Another transaction got in the way; replaying may succeed.
  TransientConflict,
  /// The database failed for a reason a replay will not fix.
  NonTransient,
  /// Not a database failure at all.
  Fatal,
}

impl ErrorClass {
  pub fn is_retryable(self) -> bool {
    self == Self::TransientConflict
  }
}

/// A pure predicate over errors of type `E`.
///
/// Implementations must be deterministic and free of side effects: the same
/// error always gets the same class.
pub trait ConflictClassifier<E: ?Sized> {
  fn classify(&self, error: &E) -> ErrorClass;
}

impl<E: ?Sized, F> ConflictClassifier<E> for F
where
  F: Fn(&E) -> ErrorClass,
{
  fn classify(&self, error: &E) -> ErrorClass {
    self(error)
  }
}

/// Maps a RocksDB status to its class.
///
/// `Busy` is what an optimistic commit reports on a write conflict (and a
/// pessimistic one on deadlock), `TryAgain` is a conflict check that could not
/// be completed, and `TimedOut` is a lock wait that ran out.
pub fn classify_kind(kind: ErrorKind) -> ErrorClass {
  match kind {
    ErrorKind::Busy | ErrorKind::TryAgain | ErrorKind::TimedOut => ErrorClass::TransientConflict,
    _ => ErrorClass::NonTransient,
  }
}

/// The default classifier for [`TxError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RocksDbConflictClassifier;

impl ConflictClassifier<TxError> for RocksDbConflictClassifier {
  fn classify(&self, error: &TxError) -> ErrorClass {
    match error {
      TxError::RocksDb(e) => classify_kind(e.kind()),
      _ => ErrorClass::Fatal,
    }
  }
}
