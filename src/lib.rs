//! Scoped transactions and conflict-retrying units of work over database sessions.
//!
//! - [`scope`]: begin, commit or roll back, and always close a session.
//! - [`retry`]: replay a unit of work when the database reports a transient
//!   write conflict, within a bounded budget.
//! - [`session`]: the `Session` contract both build on, plus a RocksDB
//!   optimistic-transaction implementation served by [`store::SessionStore`].

pub mod codec;
pub mod config;
pub mod error;
pub mod retry;
pub mod scope;
pub mod session;
pub mod store;

// --- Re-exports ---
pub use config::{RecoveryMode, SessionStoreConfig};
pub use error::{TxError, TxResult};
pub use retry::{
  with_retry, ConflictClassifier, ErrorClass, LogTarget, RetryLogger, RetryPolicy, RetryingTransaction,
  RocksDbConflictClassifier,
};
pub use scope::{session_scope, ScopedTransaction};
pub use session::{resolve_session, HasSession, Mapper, RocksDbSession, Session, SessionBinding};
pub use store::SessionStore;
