#![allow(dead_code)]

use std::sync::Once;

use tempfile::TempDir;
use txscope::{ErrorClass, HasSession, Mapper, Session, SessionBinding, SessionStore, SessionStoreConfig, TxError, TxResult};

static LOG_INIT: Once = Once::new();

pub fn setup_logging() {
  LOG_INIT.call_once(|| {
    env_logger::builder()
      .is_test(true)
      .try_init()
      .unwrap_or_else(|e| eprintln!("Failed to init logger: {}", e));
  });
}

pub fn setup_store(test_name: &str) -> (TempDir, SessionStore) {
  setup_logging();
  let temp_dir = tempfile::tempdir().unwrap();
  let db_path = temp_dir.path().join(test_name);

  let config = SessionStoreConfig {
    path: db_path.to_str().unwrap().to_string(),
    create_if_missing: true,
    ..Default::default()
  };

  let store = SessionStore::open(config).unwrap();
  (temp_dir, store)
}

/// A session that records every call and fails the ones it is told to.
#[derive(Debug, Default)]
pub struct RecordingSession {
  pub calls: Vec<&'static str>,
  pub fail_begin: bool,
  pub fail_commit: bool,
  pub fail_rollback: bool,
  pub fail_close: bool,
}

impl RecordingSession {
  pub fn count(&self, call: &str) -> usize {
    self.calls.iter().filter(|c| **c == call).count()
  }

  fn record(&mut self, call: &'static str, fail: bool) -> TxResult<()> {
    self.calls.push(call);
    if fail {
      Err(TxError::Other(format!("{} failed", call)))
    } else {
      Ok(())
    }
  }
}

impl Session for RecordingSession {
  fn begin(&mut self) -> TxResult<()> {
    let fail = self.fail_begin;
    self.record("begin", fail)
  }

  fn commit(&mut self) -> TxResult<()> {
    let fail = self.fail_commit;
    self.record("commit", fail)
  }

  fn rollback(&mut self) -> TxResult<()> {
    let fail = self.fail_rollback;
    self.record("rollback", fail)
  }

  fn close(&mut self) -> TxResult<()> {
    let fail = self.fail_close;
    self.record("close", fail)
  }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
  #[error("could not serialize access due to concurrent update")]
  WriteConflict,
  #[error("disk full")]
  DiskFull,
  #[error("insufficient funds: balance {0}")]
  InsufficientFunds(i64),
  #[error(transparent)]
  Tx(#[from] TxError),
}

pub fn classify_app_error(err: &AppError) -> ErrorClass {
  match err {
    AppError::WriteConflict => ErrorClass::TransientConflict,
    AppError::DiskFull => ErrorClass::NonTransient,
    _ => ErrorClass::Fatal,
  }
}

/// Owns its session, like a data mapper.
#[derive(Debug, Default)]
pub struct AccountMapper {
  pub session: RecordingSession,
  pub balance: i64,
}

impl HasSession for AccountMapper {
  type Session = RecordingSession;

  fn session_binding(&mut self) -> SessionBinding<'_, RecordingSession> {
    SessionBinding::Direct(&mut self.session)
  }
}

impl Mapper for AccountMapper {
  type Session = RecordingSession;

  fn session(&mut self) -> &mut RecordingSession {
    &mut self.session
  }
}

/// Reaches its session through a mapper, like a manager.
#[derive(Debug, Default)]
pub struct AccountManager {
  pub mapper: AccountMapper,
}

impl HasSession for AccountManager {
  type Session = RecordingSession;

  fn session_binding(&mut self) -> SessionBinding<'_, RecordingSession> {
    SessionBinding::Mapper(&mut self.mapper)
  }
}

/// Has no session at all.
#[derive(Debug, Default)]
pub struct Detached {
  pub calls: usize,
}

impl HasSession for Detached {
  type Session = RecordingSession;
}
