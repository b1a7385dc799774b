//! LMDB transaction handles.
//!
//! The store traits pass transactions as trait objects; this module wraps
//! heed's `RoTxn`/`RwTxn` so they can travel through `dyn ReadTxn` /
//! `dyn WriteTxn` and be recovered by downcast on the far side.

use std::any::Any;
use std::sync::Arc;

use heed::{Env, RoTxn, RwTxn};
use velo_store::{ReadTxn, StoreError, WriteTxn};

use crate::map_heed;

/// A wrapped LMDB read transaction.
pub struct LmdbReadTxn {
    // Declared before `_env` so the transaction drops first.
    txn: RoTxn<'static>,
    _env: Arc<Env>,
}

impl LmdbReadTxn {
    pub(crate) fn begin(env: Arc<Env>) -> Result<Self, StoreError> {
        let txn = env.read_txn().map_err(map_heed)?;
        // Safety: the transaction borrows the environment, which this struct
        // keeps alive via `_env`; the 'static lifetime never leaves the crate.
        let txn = unsafe { std::mem::transmute::<RoTxn<'_>, RoTxn<'static>>(txn) };
        Ok(Self { txn, _env: env })
    }

    pub(crate) fn ro(&self) -> &RoTxn<'static> {
        &self.txn
    }
}

impl ReadTxn for LmdbReadTxn {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A wrapped LMDB write transaction.
pub struct LmdbWriteTxn {
    // `Option` so `commit` can consume the inner transaction.
    txn: Option<RwTxn<'static>>,
    _env: Arc<Env>,
}

impl LmdbWriteTxn {
    pub(crate) fn begin(env: Arc<Env>) -> Result<Self, StoreError> {
        let txn = env.write_txn().map_err(map_heed)?;
        // Safety: as for LmdbReadTxn.
        let txn = unsafe { std::mem::transmute::<RwTxn<'_>, RwTxn<'static>>(txn) };
        Ok(Self {
            txn: Some(txn),
            _env: env,
        })
    }

    pub(crate) fn rw(&mut self) -> &mut RwTxn<'static> {
        self.txn.as_mut().expect("write transaction already committed")
    }

    pub(crate) fn ro(&self) -> &RoTxn<'static> {
        self.txn.as_ref().expect("write transaction already committed")
    }
}

impl ReadTxn for LmdbWriteTxn {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl WriteTxn for LmdbWriteTxn {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_read(&self) -> &dyn ReadTxn {
        self
    }

    fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        if let Some(txn) = self.txn.take() {
            txn.commit().map_err(map_heed)?;
        }
        Ok(())
    }
}

/// Recover the heed read transaction behind a trait-object handle. A write
/// transaction doubles as a read view.
pub(crate) fn ro_txn<'a>(txn: &'a dyn ReadTxn) -> Result<&'a RoTxn<'static>, StoreError> {
    if let Some(read) = txn.as_any().downcast_ref::<LmdbReadTxn>() {
        Ok(read.ro())
    } else if let Some(write) = txn.as_any().downcast_ref::<LmdbWriteTxn>() {
        Ok(write.ro())
    } else {
        Err(StoreError::Backend(
            "transaction does not belong to this store".into(),
        ))
    }
}

/// Recover the heed write transaction behind a trait-object handle.
pub(crate) fn rw_txn<'a>(txn: &'a mut dyn WriteTxn) -> Result<&'a mut RwTxn<'static>, StoreError> {
    txn.as_any_mut()
        .downcast_mut::<LmdbWriteTxn>()
        .map(LmdbWriteTxn::rw)
        .ok_or_else(|| StoreError::Backend("transaction does not belong to this store".into()))
}
