//! Block storage.
//!
//! Blocks are stored as their canonical wire bytes plus a sideband: the
//! store-side metadata (owning account, successor, settled balance, height,
//! epoch) that makes rollback and balance queries O(1) without walking
//! chains.

use crate::transaction::{ReadTxn, WriteTxn};
use crate::StoreError;
use serde::{Deserialize, Serialize};
use velo_types::{Account, Amount, BlockHash, Epoch, Timestamp};

/// Metadata recorded beside every stored block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSideband {
    /// The account whose chain this block extends.
    pub account: Account,
    /// The next block on the same chain; zero while this block is the tip.
    pub successor: BlockHash,
    /// Account balance after this block.
    pub balance: Amount,
    /// Chain height (open block = 1).
    pub height: u64,
    /// When the block was applied locally.
    pub timestamp: Timestamp,
    /// The account epoch this block was processed under.
    pub epoch: Epoch,
}

/// Trait for block storage operations.
pub trait BlockStore {
    /// Store a block's wire bytes and sideband, keyed by hash.
    fn put(
        &self,
        txn: &mut dyn WriteTxn,
        hash: &BlockHash,
        bytes: &[u8],
        sideband: &BlockSideband,
    ) -> Result<(), StoreError>;

    /// Retrieve a block's wire bytes and sideband.
    fn get(
        &self,
        txn: &dyn ReadTxn,
        hash: &BlockHash,
    ) -> Result<Option<(Vec<u8>, BlockSideband)>, StoreError>;

    /// Retrieve only the sideband.
    fn sideband(&self, txn: &dyn ReadTxn, hash: &BlockHash)
        -> Result<Option<BlockSideband>, StoreError>;

    /// Update the successor pointer of a stored block.
    fn set_successor(
        &self,
        txn: &mut dyn WriteTxn,
        hash: &BlockHash,
        successor: BlockHash,
    ) -> Result<(), StoreError>;

    /// Delete a block (rollback).
    fn del(&self, txn: &mut dyn WriteTxn, hash: &BlockHash) -> Result<(), StoreError>;

    /// Check if a block exists.
    fn exists(&self, txn: &dyn ReadTxn, hash: &BlockHash) -> Result<bool, StoreError>;

    /// Total number of blocks across all chains.
    fn count(&self, txn: &dyn ReadTxn) -> Result<u64, StoreError>;
}
