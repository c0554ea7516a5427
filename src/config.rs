//! Configuration for opening a [`SessionStore`](crate::store::SessionStore).

use rocksdb::{DBRecoveryMode as RocksDbRecoveryMode, Options as RocksDbOptions};
use std::fmt::Debug;

/// Write Ahead Log (WAL) recovery modes for RocksDB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryMode {
  AbsoluteConsistency,
  PointInTime,
  SkipAnyCorruptedRecord,
  TolerateCorruptedTailRecords,
}

impl From<RecoveryMode> for RocksDbRecoveryMode {
  fn from(rm: RecoveryMode) -> Self {
    match rm {
      RecoveryMode::AbsoluteConsistency => RocksDbRecoveryMode::AbsoluteConsistency,
      RecoveryMode::PointInTime => RocksDbRecoveryMode::PointInTime,
      RecoveryMode::SkipAnyCorruptedRecord => RocksDbRecoveryMode::SkipAnyCorruptedRecord,
      RecoveryMode::TolerateCorruptedTailRecords => RocksDbRecoveryMode::TolerateCorruptedTailRecords,
    }
  }
}

/// Callback applied last to the database options, for anything not covered by
/// the typed fields.
pub type CustomOptionsFn = dyn Fn(&mut RocksDbOptions) + Send + Sync + 'static;

/// Configuration for an optimistic transactional RocksDB serving sessions.
pub struct SessionStoreConfig {
  pub path: String,
  pub create_if_missing: bool,
  pub recovery_mode: Option<RecoveryMode>,
  pub parallelism: Option<i32>,
  pub enable_statistics: Option<bool>,
  pub custom_options: Option<Box<CustomOptionsFn>>,
}

impl Debug for SessionStoreConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SessionStoreConfig")
      .field("path", &self.path)
      .field("create_if_missing", &self.create_if_missing)
      .field("recovery_mode", &self.recovery_mode)
      .field("parallelism", &self.parallelism)
      .field("enable_statistics", &self.enable_statistics)
      .field("custom_options_is_some", &self.custom_options.is_some())
      .finish()
  }
}

impl Default for SessionStoreConfig {
  fn default() -> Self {
    Self {
      path: Default::default(),
      create_if_missing: true,
      recovery_mode: None,
      parallelism: None,
      enable_statistics: None,
      custom_options: None,
    }
  }
}

impl SessionStoreConfig {
  /// Builds the database-wide RocksDB options described by this config.
  pub(crate) fn to_db_options(&self) -> RocksDbOptions {
    let mut opts = RocksDbOptions::default();
    opts.create_if_missing(self.create_if_missing);

    if let Some(p) = self.parallelism {
      opts.increase_parallelism(p);
    }
    if let Some(mode) = self.recovery_mode {
      opts.set_wal_recovery_mode(mode.into());
    }
    if self.enable_statistics == Some(true) {
      opts.enable_statistics();
    }
    if let Some(custom) = &self.custom_options {
      custom(&mut opts);
    }
    opts
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_creates_missing_db() {
    let cfg = SessionStoreConfig::default();
    assert!(cfg.create_if_missing);
    assert!(cfg.recovery_mode.is_none());
  }

  #[test]
  fn debug_summarises_callbacks() {
    let cfg = SessionStoreConfig {
      path: "/tmp/x".into(),
      custom_options: Some(Box::new(|opts: &mut RocksDbOptions| opts.set_max_open_files(64))),
      ..Default::default()
    };
    let rendered = format!("{:?}", cfg);
    assert!(rendered.contains("custom_options_is_some: true"));
    assert!(rendered.contains("/tmp/x"));
  }
}
