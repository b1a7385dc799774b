//! Frontier storage.
//!
//! Maps each chain tip hash back to its owning account. Together with the
//! block sideband's successor pointer, this keeps tip bookkeeping mutually
//! consistent: `frontier[h] = A` exactly when `h` is `A`'s head.

use crate::transaction::{ReadTxn, WriteTxn};
use crate::StoreError;
use velo_types::{Account, BlockHash};

/// Trait for tracking account-chain frontiers.
pub trait FrontierStore {
    fn get(&self, txn: &dyn ReadTxn, hash: &BlockHash) -> Result<Option<Account>, StoreError>;
    fn put(
        &self,
        txn: &mut dyn WriteTxn,
        hash: &BlockHash,
        account: &Account,
    ) -> Result<(), StoreError>;
    fn del(&self, txn: &mut dyn WriteTxn, hash: &BlockHash) -> Result<(), StoreError>;
}
