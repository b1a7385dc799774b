//! Account storage.

use crate::transaction::{ReadTxn, WriteTxn};
use crate::StoreError;
use serde::{Deserialize, Serialize};
use velo_types::{Account, Amount, BlockHash, Epoch, Timestamp};

/// Per-account chain summary stored in the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Hash of the latest block in this account's chain.
    pub head: BlockHash,
    /// Hash of the first block in this account's chain.
    pub open_block: BlockHash,
    /// Last block that set the account's representative.
    pub rep_block: BlockHash,
    /// Confirmed balance after `head`.
    pub balance: Amount,
    /// When the chain was last extended (seconds since epoch).
    pub modified: Timestamp,
    /// Number of blocks from open to head.
    pub block_count: u64,
    /// Upgrade epoch of this chain.
    pub epoch: Epoch,
}

/// Trait for account storage operations.
pub trait AccountStore {
    fn get(&self, txn: &dyn ReadTxn, account: &Account) -> Result<Option<AccountInfo>, StoreError>;
    fn put(
        &self,
        txn: &mut dyn WriteTxn,
        account: &Account,
        info: &AccountInfo,
    ) -> Result<(), StoreError>;
    fn del(&self, txn: &mut dyn WriteTxn, account: &Account) -> Result<(), StoreError>;
    fn count(&self, txn: &dyn ReadTxn) -> Result<u64, StoreError>;
}
