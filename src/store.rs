//! The RocksDB store that hands out [`RocksDbSession`]s.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{OptimisticTransactionDB, DB as StandardDB};
use serde::{de::DeserializeOwned, Serialize};

use crate::codec::{self, AsBytes};
use crate::config::SessionStoreConfig;
use crate::error::{TxError, TxResult};
use crate::session::RocksDbSession;

/// An optimistic transactional RocksDB database, the source of sessions.
///
/// The store is `Send + Sync`; share it with `Arc` (or scoped threads) and take
/// one session per thread. Reads and writes made directly on the store act on
/// committed data and take part in conflict detection like any other commit.
pub struct SessionStore {
  db: Arc<OptimisticTransactionDB>,
  path: String,
}

impl std::fmt::Debug for SessionStore {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SessionStore").field("path", &self.path).finish()
  }
}

impl SessionStore {
  /// Opens or creates the database described by `config`.
  pub fn open(config: SessionStoreConfig) -> TxResult<Self> {
    log::info!("SessionStore: Opening optimistic transactional DB at '{}'.", config.path);
    if config.path.is_empty() {
      return Err(TxError::InvalidConfiguration("database path is empty".to_string()));
    }

    let opts = config.to_db_options();
    let db = OptimisticTransactionDB::open(&opts, &config.path)?;
    Ok(Self {
      db: Arc::new(db),
      path: config.path,
    })
  }

  /// Destroys the database files at the given path. Use with extreme caution.
  /// Every store opened on `path` must be dropped first.
  pub fn destroy(path: &Path, config: SessionStoreConfig) -> TxResult<()> {
    log::warn!("SessionStore: Destroying database at path '{}'.", path.display());
    let opts = config.to_db_options();
    StandardDB::destroy(&opts, path).map_err(TxError::RocksDb)
  }

  /// Returns the filesystem path of the database directory.
  pub fn path(&self) -> &str {
    &self.path
  }

  /// Returns a thread-safe reference to the underlying `OptimisticTransactionDB`.
  pub fn db_raw(&self) -> Arc<OptimisticTransactionDB> {
    self.db.clone()
  }

  /// Creates a session whose transactions detect write conflicts.
  pub fn session(&self) -> RocksDbSession<'_> {
    RocksDbSession::new(&self.db, &self.path, true)
  }

  /// Creates a session whose transactions skip conflict detection; concurrent
  /// writers overwrite each other. **Use with caution.**
  pub fn blind_session(&self) -> RocksDbSession<'_> {
    RocksDbSession::new(&self.db, &self.path, false)
  }

  // --- Committed data ---

  pub fn get<Key, Val>(&self, key: Key) -> TxResult<Option<Val>>
  where
    Key: AsBytes,
    Val: DeserializeOwned,
  {
    match self.db.get_pinned(codec::encode_key(key))? {
      Some(bytes) => codec::decode_value(&bytes).map(Some),
      None => Ok(None),
    }
  }

  pub fn put<Key, Val>(&self, key: Key, val: &Val) -> TxResult<()>
  where
    Key: AsBytes,
    Val: Serialize + ?Sized,
  {
    self
      .db
      .put(codec::encode_key(key), codec::encode_value(val)?)
      .map_err(TxError::RocksDb)
  }

  pub fn delete<Key>(&self, key: Key) -> TxResult<()>
  where
    Key: AsBytes,
  {
    self.db.delete(codec::encode_key(key)).map_err(TxError::RocksDb)
  }
}
