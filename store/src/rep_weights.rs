//! Representative weight storage.
//!
//! Tracks, for every representative key, the delegated balance. The sum of
//! all entries equals the sum of opened-account balances: a send debits the
//! sender's representative immediately and credits no one until the receive.

use crate::transaction::{ReadTxn, WriteTxn};
use crate::StoreError;
use velo_types::{Account, Amount};

/// Persistent storage for representative weights.
pub trait RepWeightStore {
    /// A representative's delegated weight; zero when absent.
    fn get(&self, txn: &dyn ReadTxn, rep: &Account) -> Result<Amount, StoreError>;

    /// Add delegated weight to a representative.
    fn add(&self, txn: &mut dyn WriteTxn, rep: &Account, amount: Amount) -> Result<(), StoreError>;

    /// Remove delegated weight from a representative. Saturates at zero and
    /// drops the entry when it empties.
    fn sub(&self, txn: &mut dyn WriteTxn, rep: &Account, amount: Amount) -> Result<(), StoreError>;

    /// Sum of all entries.
    fn total(&self, txn: &dyn ReadTxn) -> Result<Amount, StoreError>;
}
