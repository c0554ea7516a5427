use thiserror::Error;

/// Boxed cause carried by [`TxError::UnresolvedConflict`].
pub type ConflictCause = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum TxError {
  #[error("RocksDB operation failed: {0}")]
  RocksDb(#[from] rocksdb::Error),

  #[error("Invalid usage outside a mapper/manager context: {0}")]
  InvalidUsage(String),

  #[error("Could not replay the transaction {function} after {retries} retries ({attempts} attempts)")]
  UnresolvedConflict {
    function: String,
    retries: usize,
    attempts: usize,
    #[source]
    source: ConflictCause,
  },

  #[error("Operation requires an open transaction")]
  TransactionRequired,

  #[error("A transaction is already open on this session")]
  TransactionInProgress,

  #[error("Serialization failed: {0}")]
  Serialization(String),

  #[error("Deserialization failed: {0}")]
  Deserialization(String),

  #[error("Invalid configuration: {0}")]
  InvalidConfiguration(String),

  #[error("Underlying IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Operation failed: {0}")]
  Other(String),
}

impl TxError {
  /// True when the retry budget ran out while resolving a write conflict.
  pub fn is_unresolved_conflict(&self) -> bool {
    matches!(self, Self::UnresolvedConflict { .. })
  }

  /// True for RocksDB errors that signal a transient conflict between
  /// concurrent transactions.
  pub fn is_conflict(&self) -> bool {
    match self {
      Self::RocksDb(e) => crate::retry::classify_kind(e.kind()).is_retryable(),
      _ => false,
    }
  }

  /// Number of attempts made before giving up, for unresolved conflicts.
  pub fn attempts(&self) -> Option<usize> {
    match self {
      Self::UnresolvedConflict { attempts, .. } => Some(*attempts),
      _ => None,
    }
  }
}

pub type TxResult<T> = Result<T, TxError>;
