//! Key and value encoding for the RocksDB session backend.
//!
//! Keys are stored as their raw bytes. Values are MessagePack with struct maps,
//! so records survive field reordering.

use crate::error::{TxError, TxResult};
use rmp_serde::{Deserializer, Serializer};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Types usable as raw RocksDB keys.
pub trait AsBytes {
  fn as_bytes(&self) -> &[u8];
}

impl AsBytes for str {
  fn as_bytes(&self) -> &[u8] {
    str::as_bytes(self)
  }
}

impl AsBytes for String {
  fn as_bytes(&self) -> &[u8] {
    String::as_bytes(self)
  }
}

impl AsBytes for [u8] {
  fn as_bytes(&self) -> &[u8] {
    self
  }
}

impl AsBytes for Vec<u8> {
  fn as_bytes(&self) -> &[u8] {
    self.as_slice()
  }
}

impl<T: AsBytes + ?Sized> AsBytes for &T {
  fn as_bytes(&self) -> &[u8] {
    (**self).as_bytes()
  }
}

#[inline]
pub fn encode_key<Key>(key: Key) -> Vec<u8>
where
  Key: AsBytes,
{
  key.as_bytes().to_vec()
}

#[inline]
pub fn encode_value<Val>(val: &Val) -> TxResult<Vec<u8>>
where
  Val: Serialize + ?Sized,
{
  let mut buf = Vec::new();
  val
    .serialize(&mut Serializer::new(&mut buf).with_struct_map())
    .map_err(|e| TxError::Serialization(e.to_string()))?;
  Ok(buf)
}

#[inline]
pub fn decode_value<Val>(bytes: &[u8]) -> TxResult<Val>
where
  Val: DeserializeOwned,
{
  Val::deserialize(&mut Deserializer::new(bytes)).map_err(|e| TxError::Deserialization(e.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Serialize, Deserialize, Debug, PartialEq)]
  struct Account {
    balance: i64,
    version: u64,
  }

  #[test]
  fn keys_are_raw_bytes() {
    assert_eq!(encode_key("acc_a"), b"acc_a".to_vec());
    assert_eq!(encode_key(&String::from("k")), b"k".to_vec());
    assert_eq!(encode_key(vec![1u8, 2, 3]), vec![1, 2, 3]);
  }

  #[test]
  fn garbage_is_a_deserialization_error() {
    let err = decode_value::<Account>(&[0xc1]).unwrap_err();
    assert!(matches!(err, TxError::Deserialization(_)));
  }

  #[test]
  fn struct_values_decode_back() {
    let bytes = encode_value(&Account { balance: 7, version: 2 }).unwrap();
    let back: Account = decode_value(&bytes).unwrap();
    assert_eq!(back, Account { balance: 7, version: 2 });
  }
}
