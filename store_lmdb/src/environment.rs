//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use velo_store::{
    AccountStore, BlockStore, ChecksumStore, FrontierStore, PendingStore, ReadTxn, RepWeightStore,
    Store, StoreError, WriteTxn,
};

use crate::tables::{
    LmdbAccountStore, LmdbBlockStore, LmdbChecksumStore, LmdbFrontierStore, LmdbPendingStore,
    LmdbRepWeightStore,
};
use crate::transaction::{LmdbReadTxn, LmdbWriteTxn};
use crate::map_heed;

const MAX_DBS: u32 = 8;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbStore {
    env: Arc<Env>,
    accounts: LmdbAccountStore,
    blocks: LmdbBlockStore,
    pending: LmdbPendingStore,
    frontiers: LmdbFrontierStore,
    rep_weights: LmdbRepWeightStore,
    checksums: LmdbChecksumStore,
}

impl LmdbStore {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)
            .map_err(|e| StoreError::Backend(format!("failed to create directory: {e}")))?;

        let env = unsafe {
            EnvOpenOptions::new()
                .max_dbs(MAX_DBS)
                .map_size(map_size)
                .open(path)
                .map_err(map_heed)?
        };

        let mut wtxn = env.write_txn().map_err(map_heed)?;

        let accounts_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("accounts")).map_err(map_heed)?;
        let blocks_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("blocks")).map_err(map_heed)?;
        let pending_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("pending")).map_err(map_heed)?;
        let frontiers_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("frontiers")).map_err(map_heed)?;
        let rep_weights_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("rep_weights")).map_err(map_heed)?;
        let checksums_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("checksums")).map_err(map_heed)?;

        wtxn.commit().map_err(map_heed)?;

        Ok(Self {
            env: Arc::new(env),
            accounts: LmdbAccountStore { db: accounts_db },
            blocks: LmdbBlockStore { db: blocks_db },
            pending: LmdbPendingStore { db: pending_db },
            frontiers: LmdbFrontierStore { db: frontiers_db },
            rep_weights: LmdbRepWeightStore { db: rep_weights_db },
            checksums: LmdbChecksumStore { db: checksums_db },
        })
    }
}

impl Store for LmdbStore {
    fn tx_begin_read(&self) -> Result<Box<dyn ReadTxn + '_>, StoreError> {
        Ok(Box::new(LmdbReadTxn::begin(Arc::clone(&self.env))?))
    }

    fn tx_begin_write(&self) -> Result<Box<dyn WriteTxn + '_>, StoreError> {
        Ok(Box::new(LmdbWriteTxn::begin(Arc::clone(&self.env))?))
    }

    fn accounts(&self) -> &dyn AccountStore {
        &self.accounts
    }

    fn blocks(&self) -> &dyn BlockStore {
        &self.blocks
    }

    fn pending(&self) -> &dyn PendingStore {
        &self.pending
    }

    fn frontiers(&self) -> &dyn FrontierStore {
        &self.frontiers
    }

    fn rep_weights(&self) -> &dyn RepWeightStore {
        &self.rep_weights
    }

    fn checksums(&self) -> &dyn ChecksumStore {
        &self.checksums
    }
}
