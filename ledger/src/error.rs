use thiserror::Error;
use velo_store::StoreError;
use velo_types::{Account, BlockHash};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("block not found: {0}")]
    BlockNotFound(BlockHash),

    #[error("account not found: {0}")]
    AccountNotFound(Account),

    #[error("malformed block: {0}")]
    MalformedBlock(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}
