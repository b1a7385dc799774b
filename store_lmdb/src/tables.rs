//! LMDB implementations of the table traits.
//!
//! Values are bincode-encoded records; keys are the raw 32-byte identifiers
//! (pending keys concatenate destination and send hash).

use heed::types::Bytes;
use heed::Database;

use velo_store::{
    AccountInfo, AccountStore, BlockSideband, BlockStore, ChecksumStore, FrontierStore,
    PendingInfo, PendingKey, PendingStore, ReadTxn, RepWeightStore, StoreError, WriteTxn,
};
use velo_types::{Account, Amount, BlockHash};

use crate::transaction::{ro_txn, rw_txn};
use crate::{map_bincode, map_heed};

fn pending_key_bytes(key: &PendingKey) -> [u8; 64] {
    let mut bytes = [0u8; 64];
    bytes[0..32].copy_from_slice(key.destination.as_bytes());
    bytes[32..64].copy_from_slice(key.send_hash.as_bytes());
    bytes
}

pub struct LmdbAccountStore {
    pub(crate) db: Database<Bytes, Bytes>,
}

impl AccountStore for LmdbAccountStore {
    fn get(&self, txn: &dyn ReadTxn, account: &Account) -> Result<Option<AccountInfo>, StoreError> {
        let ro = ro_txn(txn)?;
        match self.db.get(ro, account.as_bytes()).map_err(map_heed)? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(map_bincode)?)),
            None => Ok(None),
        }
    }

    fn put(
        &self,
        txn: &mut dyn WriteTxn,
        account: &Account,
        info: &AccountInfo,
    ) -> Result<(), StoreError> {
        let bytes = bincode::serialize(info).map_err(map_bincode)?;
        let rw = rw_txn(txn)?;
        self.db.put(rw, account.as_bytes(), &bytes).map_err(map_heed)
    }

    fn del(&self, txn: &mut dyn WriteTxn, account: &Account) -> Result<(), StoreError> {
        let rw = rw_txn(txn)?;
        self.db.delete(rw, account.as_bytes()).map_err(map_heed)?;
        Ok(())
    }

    fn count(&self, txn: &dyn ReadTxn) -> Result<u64, StoreError> {
        let ro = ro_txn(txn)?;
        self.db.len(ro).map_err(map_heed)
    }
}

pub struct LmdbBlockStore {
    pub(crate) db: Database<Bytes, Bytes>,
}

impl BlockStore for LmdbBlockStore {
    fn put(
        &self,
        txn: &mut dyn WriteTxn,
        hash: &BlockHash,
        bytes: &[u8],
        sideband: &BlockSideband,
    ) -> Result<(), StoreError> {
        let value = bincode::serialize(&(bytes, sideband)).map_err(map_bincode)?;
        let rw = rw_txn(txn)?;
        self.db.put(rw, hash.as_bytes(), &value).map_err(map_heed)
    }

    fn get(
        &self,
        txn: &dyn ReadTxn,
        hash: &BlockHash,
    ) -> Result<Option<(Vec<u8>, BlockSideband)>, StoreError> {
        let ro = ro_txn(txn)?;
        match self.db.get(ro, hash.as_bytes()).map_err(map_heed)? {
            Some(value) => Ok(Some(bincode::deserialize(value).map_err(map_bincode)?)),
            None => Ok(None),
        }
    }

    fn sideband(
        &self,
        txn: &dyn ReadTxn,
        hash: &BlockHash,
    ) -> Result<Option<BlockSideband>, StoreError> {
        Ok(self.get(txn, hash)?.map(|(_, sideband)| sideband))
    }

    fn set_successor(
        &self,
        txn: &mut dyn WriteTxn,
        hash: &BlockHash,
        successor: BlockHash,
    ) -> Result<(), StoreError> {
        let (bytes, mut sideband) = self
            .get(txn.as_read(), hash)?
            .ok_or_else(|| StoreError::NotFound(format!("block {:?}", hash)))?;
        sideband.successor = successor;
        self.put(txn, hash, &bytes, &sideband)
    }

    fn del(&self, txn: &mut dyn WriteTxn, hash: &BlockHash) -> Result<(), StoreError> {
        let rw = rw_txn(txn)?;
        self.db.delete(rw, hash.as_bytes()).map_err(map_heed)?;
        Ok(())
    }

    fn exists(&self, txn: &dyn ReadTxn, hash: &BlockHash) -> Result<bool, StoreError> {
        let ro = ro_txn(txn)?;
        Ok(self.db.get(ro, hash.as_bytes()).map_err(map_heed)?.is_some())
    }

    fn count(&self, txn: &dyn ReadTxn) -> Result<u64, StoreError> {
        let ro = ro_txn(txn)?;
        self.db.len(ro).map_err(map_heed)
    }
}

pub struct LmdbPendingStore {
    pub(crate) db: Database<Bytes, Bytes>,
}

impl PendingStore for LmdbPendingStore {
    fn get(&self, txn: &dyn ReadTxn, key: &PendingKey) -> Result<Option<PendingInfo>, StoreError> {
        let ro = ro_txn(txn)?;
        match self
            .db
            .get(ro, &pending_key_bytes(key))
            .map_err(map_heed)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(map_bincode)?)),
            None => Ok(None),
        }
    }

    fn put(
        &self,
        txn: &mut dyn WriteTxn,
        key: &PendingKey,
        info: &PendingInfo,
    ) -> Result<(), StoreError> {
        let bytes = bincode::serialize(info).map_err(map_bincode)?;
        let rw = rw_txn(txn)?;
        self.db
            .put(rw, &pending_key_bytes(key), &bytes)
            .map_err(map_heed)
    }

    fn del(&self, txn: &mut dyn WriteTxn, key: &PendingKey) -> Result<(), StoreError> {
        let rw = rw_txn(txn)?;
        self.db
            .delete(rw, &pending_key_bytes(key))
            .map_err(map_heed)?;
        Ok(())
    }

    fn exists(&self, txn: &dyn ReadTxn, key: &PendingKey) -> Result<bool, StoreError> {
        let ro = ro_txn(txn)?;
        Ok(self
            .db
            .get(ro, &pending_key_bytes(key))
            .map_err(map_heed)?
            .is_some())
    }

    fn total_for(&self, txn: &dyn ReadTxn, destination: &Account) -> Result<Amount, StoreError> {
        let ro = ro_txn(txn)?;
        let mut total = Amount::ZERO;
        let iter = self
            .db
            .prefix_iter(ro, destination.as_bytes())
            .map_err(map_heed)?;
        for entry in iter {
            let (_, value) = entry.map_err(map_heed)?;
            let info: PendingInfo = bincode::deserialize(value).map_err(map_bincode)?;
            total = total.saturating_add(info.amount);
        }
        Ok(total)
    }
}

pub struct LmdbFrontierStore {
    pub(crate) db: Database<Bytes, Bytes>,
}

impl FrontierStore for LmdbFrontierStore {
    fn get(&self, txn: &dyn ReadTxn, hash: &BlockHash) -> Result<Option<Account>, StoreError> {
        let ro = ro_txn(txn)?;
        match self.db.get(ro, hash.as_bytes()).map_err(map_heed)? {
            Some(bytes) => {
                let raw: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| StoreError::Corruption("frontier value length".into()))?;
                Ok(Some(Account::new(raw)))
            }
            None => Ok(None),
        }
    }

    fn put(
        &self,
        txn: &mut dyn WriteTxn,
        hash: &BlockHash,
        account: &Account,
    ) -> Result<(), StoreError> {
        let rw = rw_txn(txn)?;
        self.db
            .put(rw, hash.as_bytes(), account.as_bytes())
            .map_err(map_heed)
    }

    fn del(&self, txn: &mut dyn WriteTxn, hash: &BlockHash) -> Result<(), StoreError> {
        let rw = rw_txn(txn)?;
        self.db.delete(rw, hash.as_bytes()).map_err(map_heed)?;
        Ok(())
    }
}

pub struct LmdbRepWeightStore {
    pub(crate) db: Database<Bytes, Bytes>,
}

impl LmdbRepWeightStore {
    fn read(&self, txn: &dyn ReadTxn, rep: &Account) -> Result<Amount, StoreError> {
        let ro = ro_txn(txn)?;
        match self.db.get(ro, rep.as_bytes()).map_err(map_heed)? {
            Some(bytes) => {
                let raw: [u8; 16] = bytes
                    .try_into()
                    .map_err(|_| StoreError::Corruption("weight value length".into()))?;
                Ok(Amount::from_be_bytes(raw))
            }
            None => Ok(Amount::ZERO),
        }
    }

    fn write(&self, txn: &mut dyn WriteTxn, rep: &Account, weight: Amount) -> Result<(), StoreError> {
        let rw = rw_txn(txn)?;
        if weight.is_zero() {
            self.db.delete(rw, rep.as_bytes()).map_err(map_heed)?;
        } else {
            self.db
                .put(rw, rep.as_bytes(), &weight.to_be_bytes())
                .map_err(map_heed)?;
        }
        Ok(())
    }
}

impl RepWeightStore for LmdbRepWeightStore {
    fn get(&self, txn: &dyn ReadTxn, rep: &Account) -> Result<Amount, StoreError> {
        self.read(txn, rep)
    }

    fn add(&self, txn: &mut dyn WriteTxn, rep: &Account, amount: Amount) -> Result<(), StoreError> {
        let current = self.read(txn.as_read(), rep)?;
        self.write(txn, rep, current.saturating_add(amount))
    }

    fn sub(&self, txn: &mut dyn WriteTxn, rep: &Account, amount: Amount) -> Result<(), StoreError> {
        let current = self.read(txn.as_read(), rep)?;
        self.write(txn, rep, current.saturating_sub(amount))
    }

    fn total(&self, txn: &dyn ReadTxn) -> Result<Amount, StoreError> {
        let ro = ro_txn(txn)?;
        let mut total = Amount::ZERO;
        for entry in self.db.iter(ro).map_err(map_heed)? {
            let (_, value) = entry.map_err(map_heed)?;
            let raw: [u8; 16] = value
                .try_into()
                .map_err(|_| StoreError::Corruption("weight value length".into()))?;
            total = total.saturating_add(Amount::from_be_bytes(raw));
        }
        Ok(total)
    }
}

pub struct LmdbChecksumStore {
    pub(crate) db: Database<Bytes, Bytes>,
}

impl ChecksumStore for LmdbChecksumStore {
    fn get(&self, txn: &dyn ReadTxn, bucket: u8) -> Result<BlockHash, StoreError> {
        let ro = ro_txn(txn)?;
        match self.db.get(ro, &[bucket]).map_err(map_heed)? {
            Some(bytes) => {
                let raw: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| StoreError::Corruption("checksum value length".into()))?;
                Ok(BlockHash::new(raw))
            }
            None => Ok(BlockHash::ZERO),
        }
    }

    fn put(&self, txn: &mut dyn WriteTxn, bucket: u8, hash: &BlockHash) -> Result<(), StoreError> {
        let rw = rw_txn(txn)?;
        self.db.put(rw, &[bucket], hash.as_bytes()).map_err(map_heed)
    }
}
