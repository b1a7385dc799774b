//! Checksum bucket storage.
//!
//! 256 buckets keyed by a hash's high-order byte, each holding the XOR fold
//! of the resident block hashes that land in it.

use crate::transaction::{ReadTxn, WriteTxn};
use crate::StoreError;
use velo_types::BlockHash;

/// Trait for checksum bucket storage.
pub trait ChecksumStore {
    /// Current fold of a bucket; zero when never written.
    fn get(&self, txn: &dyn ReadTxn, bucket: u8) -> Result<BlockHash, StoreError>;

    /// Overwrite a bucket's fold.
    fn put(&self, txn: &mut dyn WriteTxn, bucket: u8, hash: &BlockHash) -> Result<(), StoreError>;
}
