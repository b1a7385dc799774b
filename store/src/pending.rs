//! Pending receive storage.

use crate::transaction::{ReadTxn, WriteTxn};
use crate::StoreError;
use serde::{Deserialize, Serialize};
use velo_types::{Account, Amount, BlockHash, Epoch};

/// Key of a pending entry: the claim a send created for its destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PendingKey {
    pub destination: Account,
    pub send_hash: BlockHash,
}

impl PendingKey {
    pub fn new(destination: Account, send_hash: BlockHash) -> Self {
        Self {
            destination,
            send_hash,
        }
    }
}

/// An outstanding claim: created by a send, consumed by the matching
/// receive or open on the destination chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInfo {
    /// The sending account.
    pub source: Account,
    /// Amount in transit.
    pub amount: Amount,
    /// The sender's epoch when the send was processed. Legacy receives may
    /// only consume `Epoch0` claims.
    pub epoch: Epoch,
}

/// Trait for tracking pending receives.
pub trait PendingStore {
    fn get(&self, txn: &dyn ReadTxn, key: &PendingKey) -> Result<Option<PendingInfo>, StoreError>;
    fn put(
        &self,
        txn: &mut dyn WriteTxn,
        key: &PendingKey,
        info: &PendingInfo,
    ) -> Result<(), StoreError>;
    fn del(&self, txn: &mut dyn WriteTxn, key: &PendingKey) -> Result<(), StoreError>;
    fn exists(&self, txn: &dyn ReadTxn, key: &PendingKey) -> Result<bool, StoreError>;
    /// Sum of pending amounts destined for an account.
    fn total_for(&self, txn: &dyn ReadTxn, destination: &Account) -> Result<Amount, StoreError>;
}
