//! The session contract shared by scoped and retrying transactions.
//!
//! A [`Session`] is a handle onto a database connection with at most one open
//! transaction. The wrappers in this crate never create or destroy sessions;
//! they only call the four transaction operations in fixed sequences.
//!
//! Retried units of work receive a *receiver* rather than a bare session. The
//! receiver says where its session lives through [`HasSession`]: either it owns
//! one directly (a mapper), or it reaches one through a [`Mapper`] it holds
//! (a manager).

pub mod optimistic;

use crate::error::{TxError, TxResult};

pub use self::optimistic::RocksDbSession;

/// Transaction control over a database session.
pub trait Session {
  /// Opens a new transaction.
  fn begin(&mut self) -> TxResult<()>;

  /// Commits the open transaction.
  fn commit(&mut self) -> TxResult<()>;

  /// Discards the open transaction.
  fn rollback(&mut self) -> TxResult<()>;

  /// Releases the session, discarding any partial transaction state.
  /// A closed session can begin again.
  fn close(&mut self) -> TxResult<()>;
}

impl<S: Session + ?Sized> Session for &mut S {
  fn begin(&mut self) -> TxResult<()> {
    (**self).begin()
  }

  fn commit(&mut self) -> TxResult<()> {
    (**self).commit()
  }

  fn rollback(&mut self) -> TxResult<()> {
    (**self).rollback()
  }

  fn close(&mut self) -> TxResult<()> {
    (**self).close()
  }
}

/// An object that owns a session on behalf of others.
pub trait Mapper {
  type Session: Session;

  fn session(&mut self) -> &mut Self::Session;
}

/// Where a receiver keeps its session.
pub enum SessionBinding<'a, S: Session> {
  /// The receiver owns the session.
  Direct(&'a mut S),
  /// The receiver reaches the session through a mapper.
  Mapper(&'a mut dyn Mapper<Session = S>),
  /// The receiver has no session.
  Unbound,
}

/// Receivers of retried units of work.
///
/// Implementors override [`session_binding`](HasSession::session_binding);
/// the default reports [`SessionBinding::Unbound`], which makes every retried
/// call on the receiver fail with [`TxError::InvalidUsage`].
pub trait HasSession {
  type Session: Session;

  fn session_binding(&mut self) -> SessionBinding<'_, Self::Session> {
    SessionBinding::Unbound
  }
}

/// Finds the session of `receiver`, preferring one it owns over one reached
/// through its mapper.
pub fn resolve_session<R>(receiver: &mut R) -> TxResult<&mut R::Session>
where
  R: HasSession + ?Sized,
{
  match receiver.session_binding() {
    SessionBinding::Direct(session) => Ok(session),
    SessionBinding::Mapper(mapper) => Ok(mapper.session()),
    SessionBinding::Unbound => Err(TxError::InvalidUsage(format!(
      "{} exposes neither a session nor a mapper",
      std::any::type_name::<R>()
    ))),
  }
}
