//! LMDB storage backend for the velo ledger.
//!
//! Implements the storage traits from `velo-store` using the `heed` LMDB
//! bindings. Each table family maps to one named LMDB database within a
//! single environment, and the trait-object transaction handles wrap real
//! LMDB read/write transactions.

pub mod environment;
pub mod tables;
pub mod transaction;

pub use environment::LmdbStore;
pub use transaction::{LmdbReadTxn, LmdbWriteTxn};

use velo_store::StoreError;

pub(crate) fn map_heed(err: heed::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

pub(crate) fn map_bincode(err: bincode::Error) -> StoreError {
    StoreError::Serialization(err.to_string())
}
