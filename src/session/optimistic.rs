//! A [`Session`] over a RocksDB `OptimisticTransactionDB`.

use super::Session;
use crate::codec::{self, AsBytes};
use crate::error::{TxError, TxResult};

use rocksdb::{OptimisticTransactionDB, OptimisticTransactionOptions, Transaction, WriteOptions};
use serde::{de::DeserializeOwned, Serialize};

/// A session holding at most one optimistic RocksDB transaction.
///
/// Obtain one with `SessionStore::session()`. `begin()` opens a transaction,
/// the typed accessors stage reads and writes inside it, and `commit()` applies
/// them. A conflicting concurrent write surfaces on `commit()` as a RocksDB
/// `Busy` or `TryAgain` error, which the retry layer treats as transient.
///
/// If the session is dropped with a transaction still open, the transaction is
/// rolled back.
pub struct RocksDbSession<'db> {
  db: &'db OptimisticTransactionDB,
  path: &'db str,
  with_snapshot: bool,
  txn: Option<Transaction<'db, OptimisticTransactionDB>>,
}

impl<'db> RocksDbSession<'db> {
  pub(crate) fn new(db: &'db OptimisticTransactionDB, path: &'db str, with_snapshot: bool) -> Self {
    Self {
      db,
      path,
      with_snapshot,
      txn: None,
    }
  }

  /// Whether a transaction is currently open.
  pub fn in_transaction(&self) -> bool {
    self.txn.is_some()
  }

  /// Whether transactions of this session detect write conflicts.
  pub fn detects_conflicts(&self) -> bool {
    self.with_snapshot
  }

  fn active(&self) -> TxResult<&Transaction<'db, OptimisticTransactionDB>> {
    self.txn.as_ref().ok_or(TxError::TransactionRequired)
  }

  // --- Reads inside the open transaction ---

  pub fn get<Key, Val>(&self, key: Key) -> TxResult<Option<Val>>
  where
    Key: AsBytes,
    Val: DeserializeOwned,
  {
    let txn = self.active()?;
    match txn.get_pinned(codec::encode_key(key))? {
      Some(bytes) => codec::decode_value(&bytes).map(Some),
      None => Ok(None),
    }
  }

  /// Reads `key` and tracks it for conflict detection, so a concurrent write to
  /// it fails this transaction's commit.
  pub fn get_for_update<Key, Val>(&self, key: Key) -> TxResult<Option<Val>>
  where
    Key: AsBytes,
    Val: DeserializeOwned,
  {
    let txn = self.active()?;
    match txn.get_for_update(codec::encode_key(key), true)? {
      Some(bytes) => codec::decode_value(&bytes).map(Some),
      None => Ok(None),
    }
  }

  pub fn exists<Key>(&self, key: Key) -> TxResult<bool>
  where
    Key: AsBytes,
  {
    let txn = self.active()?;
    Ok(txn.get_pinned(codec::encode_key(key))?.is_some())
  }

  // --- Writes staged in the open transaction ---

  pub fn put<Key, Val>(&self, key: Key, val: &Val) -> TxResult<()>
  where
    Key: AsBytes,
    Val: Serialize + ?Sized,
  {
    let txn = self.active()?;
    txn.put(codec::encode_key(key), codec::encode_value(val)?)?;
    Ok(())
  }

  pub fn delete<Key>(&self, key: Key) -> TxResult<()>
  where
    Key: AsBytes,
  {
    let txn = self.active()?;
    txn.delete(codec::encode_key(key))?;
    Ok(())
  }
}

impl Session for RocksDbSession<'_> {
  fn begin(&mut self) -> TxResult<()> {
    if self.txn.is_some() {
      return Err(TxError::TransactionInProgress);
    }
    let write_opts = WriteOptions::new();
    let mut txn_opts = OptimisticTransactionOptions::new();
    txn_opts.set_snapshot(self.with_snapshot);
    self.txn = Some(self.db.transaction_opt(&write_opts, &txn_opts));
    Ok(())
  }

  fn commit(&mut self) -> TxResult<()> {
    let txn = self.txn.take().ok_or(TxError::TransactionRequired)?;
    txn.commit().map_err(TxError::RocksDb)
  }

  fn rollback(&mut self) -> TxResult<()> {
    match self.txn.take() {
      Some(txn) => txn.rollback().map_err(TxError::RocksDb),
      None => Ok(()),
    }
  }

  fn close(&mut self) -> TxResult<()> {
    if let Some(txn) = self.txn.take() {
      log::trace!("Closing session on '{}' with an open transaction; discarding it.", self.path);
      txn.rollback()?;
    }
    Ok(())
  }
}

impl Drop for RocksDbSession<'_> {
  fn drop(&mut self) {
    if let Some(txn) = self.txn.take() {
      log::warn!(
        "RocksDbSession for DB at '{}' dropped with an open transaction. Rolling back.",
        self.path
      );
      if let Err(e) = txn.rollback() {
        log::error!("Auto-rollback of session transaction failed: {}", e);
      }
    }
  }
}
