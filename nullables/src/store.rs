//! Nullable store: thread-safe in-memory storage for testing.
//!
//! Implements every table trait over mutex-guarded maps. Transactions are
//! markers: writes apply immediately, which is sufficient because the ledger
//! performs all validation before its first mutation.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Mutex;

use velo_store::{
    AccountInfo, AccountStore, BlockSideband, BlockStore, ChecksumStore, FrontierStore,
    PendingInfo, PendingKey, PendingStore, ReadTxn, RepWeightStore, Store, StoreError, WriteTxn,
};
use velo_types::{Account, Amount, BlockHash};

/// Marker read transaction for the in-memory store.
pub struct MemReadTxn;

impl ReadTxn for MemReadTxn {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Marker write transaction for the in-memory store.
pub struct MemWriteTxn;

impl ReadTxn for MemWriteTxn {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl WriteTxn for MemWriteTxn {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_read(&self) -> &dyn ReadTxn {
        self
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

/// An in-memory store holding every ledger table.
#[derive(Default)]
pub struct MemStore {
    accounts: Mutex<HashMap<Account, AccountInfo>>,
    blocks: Mutex<HashMap<BlockHash, (Vec<u8>, BlockSideband)>>,
    pending: Mutex<HashMap<PendingKey, PendingInfo>>,
    frontiers: Mutex<HashMap<BlockHash, Account>>,
    rep_weights: Mutex<HashMap<Account, Amount>>,
    checksums: Mutex<HashMap<u8, BlockHash>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemStore {
    fn tx_begin_read(&self) -> Result<Box<dyn ReadTxn + '_>, StoreError> {
        Ok(Box::new(MemReadTxn))
    }

    fn tx_begin_write(&self) -> Result<Box<dyn WriteTxn + '_>, StoreError> {
        Ok(Box::new(MemWriteTxn))
    }

    fn accounts(&self) -> &dyn AccountStore {
        self
    }

    fn blocks(&self) -> &dyn BlockStore {
        self
    }

    fn pending(&self) -> &dyn PendingStore {
        self
    }

    fn frontiers(&self) -> &dyn FrontierStore {
        self
    }

    fn rep_weights(&self) -> &dyn RepWeightStore {
        self
    }

    fn checksums(&self) -> &dyn ChecksumStore {
        self
    }
}

impl AccountStore for MemStore {
    fn get(&self, _txn: &dyn ReadTxn, account: &Account) -> Result<Option<AccountInfo>, StoreError> {
        Ok(self.accounts.lock().unwrap().get(account).cloned())
    }

    fn put(
        &self,
        _txn: &mut dyn WriteTxn,
        account: &Account,
        info: &AccountInfo,
    ) -> Result<(), StoreError> {
        self.accounts.lock().unwrap().insert(*account, info.clone());
        Ok(())
    }

    fn del(&self, _txn: &mut dyn WriteTxn, account: &Account) -> Result<(), StoreError> {
        self.accounts.lock().unwrap().remove(account);
        Ok(())
    }

    fn count(&self, _txn: &dyn ReadTxn) -> Result<u64, StoreError> {
        Ok(self.accounts.lock().unwrap().len() as u64)
    }
}

impl BlockStore for MemStore {
    fn put(
        &self,
        _txn: &mut dyn WriteTxn,
        hash: &BlockHash,
        bytes: &[u8],
        sideband: &BlockSideband,
    ) -> Result<(), StoreError> {
        self.blocks
            .lock()
            .unwrap()
            .insert(*hash, (bytes.to_vec(), sideband.clone()));
        Ok(())
    }

    fn get(
        &self,
        _txn: &dyn ReadTxn,
        hash: &BlockHash,
    ) -> Result<Option<(Vec<u8>, BlockSideband)>, StoreError> {
        Ok(self.blocks.lock().unwrap().get(hash).cloned())
    }

    fn sideband(
        &self,
        _txn: &dyn ReadTxn,
        hash: &BlockHash,
    ) -> Result<Option<BlockSideband>, StoreError> {
        Ok(self
            .blocks
            .lock()
            .unwrap()
            .get(hash)
            .map(|(_, sideband)| sideband.clone()))
    }

    fn set_successor(
        &self,
        _txn: &mut dyn WriteTxn,
        hash: &BlockHash,
        successor: BlockHash,
    ) -> Result<(), StoreError> {
        let mut blocks = self.blocks.lock().unwrap();
        let (_, sideband) = blocks
            .get_mut(hash)
            .ok_or_else(|| StoreError::NotFound(format!("block {:?}", hash)))?;
        sideband.successor = successor;
        Ok(())
    }

    fn del(&self, _txn: &mut dyn WriteTxn, hash: &BlockHash) -> Result<(), StoreError> {
        self.blocks.lock().unwrap().remove(hash);
        Ok(())
    }

    fn exists(&self, _txn: &dyn ReadTxn, hash: &BlockHash) -> Result<bool, StoreError> {
        Ok(self.blocks.lock().unwrap().contains_key(hash))
    }

    fn count(&self, _txn: &dyn ReadTxn) -> Result<u64, StoreError> {
        Ok(self.blocks.lock().unwrap().len() as u64)
    }
}

impl PendingStore for MemStore {
    fn get(&self, _txn: &dyn ReadTxn, key: &PendingKey) -> Result<Option<PendingInfo>, StoreError> {
        Ok(self.pending.lock().unwrap().get(key).cloned())
    }

    fn put(
        &self,
        _txn: &mut dyn WriteTxn,
        key: &PendingKey,
        info: &PendingInfo,
    ) -> Result<(), StoreError> {
        self.pending.lock().unwrap().insert(*key, info.clone());
        Ok(())
    }

    fn del(&self, _txn: &mut dyn WriteTxn, key: &PendingKey) -> Result<(), StoreError> {
        self.pending.lock().unwrap().remove(key);
        Ok(())
    }

    fn exists(&self, _txn: &dyn ReadTxn, key: &PendingKey) -> Result<bool, StoreError> {
        Ok(self.pending.lock().unwrap().contains_key(key))
    }

    fn total_for(&self, _txn: &dyn ReadTxn, destination: &Account) -> Result<Amount, StoreError> {
        let total = self
            .pending
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| key.destination == *destination)
            .fold(Amount::ZERO, |sum, (_, info)| sum.saturating_add(info.amount));
        Ok(total)
    }
}

impl FrontierStore for MemStore {
    fn get(&self, _txn: &dyn ReadTxn, hash: &BlockHash) -> Result<Option<Account>, StoreError> {
        Ok(self.frontiers.lock().unwrap().get(hash).copied())
    }

    fn put(
        &self,
        _txn: &mut dyn WriteTxn,
        hash: &BlockHash,
        account: &Account,
    ) -> Result<(), StoreError> {
        self.frontiers.lock().unwrap().insert(*hash, *account);
        Ok(())
    }

    fn del(&self, _txn: &mut dyn WriteTxn, hash: &BlockHash) -> Result<(), StoreError> {
        self.frontiers.lock().unwrap().remove(hash);
        Ok(())
    }
}

impl RepWeightStore for MemStore {
    fn get(&self, _txn: &dyn ReadTxn, rep: &Account) -> Result<Amount, StoreError> {
        Ok(self
            .rep_weights
            .lock()
            .unwrap()
            .get(rep)
            .copied()
            .unwrap_or(Amount::ZERO))
    }

    fn add(&self, _txn: &mut dyn WriteTxn, rep: &Account, amount: Amount) -> Result<(), StoreError> {
        let mut weights = self.rep_weights.lock().unwrap();
        let entry = weights.entry(*rep).or_insert(Amount::ZERO);
        *entry = entry.saturating_add(amount);
        Ok(())
    }

    fn sub(&self, _txn: &mut dyn WriteTxn, rep: &Account, amount: Amount) -> Result<(), StoreError> {
        let mut weights = self.rep_weights.lock().unwrap();
        if let Some(entry) = weights.get_mut(rep) {
            *entry = entry.saturating_sub(amount);
            if entry.is_zero() {
                weights.remove(rep);
            }
        }
        Ok(())
    }

    fn total(&self, _txn: &dyn ReadTxn) -> Result<Amount, StoreError> {
        let total = self
            .rep_weights
            .lock()
            .unwrap()
            .values()
            .fold(Amount::ZERO, |sum, w| sum.saturating_add(*w));
        Ok(total)
    }
}

impl ChecksumStore for MemStore {
    fn get(&self, _txn: &dyn ReadTxn, bucket: u8) -> Result<BlockHash, StoreError> {
        Ok(self
            .checksums
            .lock()
            .unwrap()
            .get(&bucket)
            .copied()
            .unwrap_or(BlockHash::ZERO))
    }

    fn put(&self, _txn: &mut dyn WriteTxn, bucket: u8, hash: &BlockHash) -> Result<(), StoreError> {
        self.checksums.lock().unwrap().insert(bucket, *hash);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use velo_types::{Epoch, Timestamp};

    fn account(byte: u8) -> Account {
        Account::new([byte; 32])
    }

    fn hash(byte: u8) -> BlockHash {
        BlockHash::new([byte; 32])
    }

    #[test]
    fn account_put_get_del() {
        let store = MemStore::new();
        let mut txn = store.tx_begin_write().unwrap();
        let info = AccountInfo {
            head: hash(1),
            open_block: hash(1),
            rep_block: hash(1),
            balance: Amount::new(5),
            modified: Timestamp::new(9),
            block_count: 1,
            epoch: Epoch::Epoch0,
        };
        store.accounts().put(txn.as_mut(), &account(1), &info).unwrap();
        assert_eq!(
            store.accounts().get(txn.as_read(), &account(1)).unwrap(),
            Some(info)
        );
        assert_eq!(store.accounts().count(txn.as_read()).unwrap(), 1);
        store.accounts().del(txn.as_mut(), &account(1)).unwrap();
        assert!(store.accounts().get(txn.as_read(), &account(1)).unwrap().is_none());
    }

    #[test]
    fn rep_weight_saturates_and_drops_empty_entries() {
        let store = MemStore::new();
        let mut txn = store.tx_begin_write().unwrap();
        let rep = account(2);
        store.rep_weights().add(txn.as_mut(), &rep, Amount::new(70)).unwrap();
        store.rep_weights().sub(txn.as_mut(), &rep, Amount::new(100)).unwrap();
        assert_eq!(store.rep_weights().get(txn.as_read(), &rep).unwrap(), Amount::ZERO);
        assert_eq!(store.rep_weights().total(txn.as_read()).unwrap(), Amount::ZERO);
    }

    #[test]
    fn successor_update_requires_block() {
        let store = MemStore::new();
        let mut txn = store.tx_begin_write().unwrap();
        assert!(store
            .blocks()
            .set_successor(txn.as_mut(), &hash(3), hash(4))
            .is_err());
    }

    #[test]
    fn pending_total_for_sums_by_destination() {
        let store = MemStore::new();
        let mut txn = store.tx_begin_write().unwrap();
        let dest = account(7);
        for (i, amount) in [25u128, 75].iter().enumerate() {
            store
                .pending()
                .put(
                    txn.as_mut(),
                    &PendingKey::new(dest, hash(i as u8 + 1)),
                    &PendingInfo {
                        source: account(9),
                        amount: Amount::new(*amount),
                        epoch: Epoch::Epoch0,
                    },
                )
                .unwrap();
        }
        assert_eq!(
            store.pending().total_for(txn.as_read(), &dest).unwrap(),
            Amount::new(100)
        );
        assert_eq!(
            store.pending().total_for(txn.as_read(), &account(8)).unwrap(),
            Amount::ZERO
        );
    }
}
