//! Genesis block and ledger constants.
//!
//! Genesis is a fixed open block whose source, representative, and account
//! are all the genesis account; initialization credits it the entire supply.

use velo_crypto::keypair_from_seed;
use velo_types::{Account, Amount, BlockHash, KeyPair};
use velo_work::WorkThresholds;

use crate::block::{Block, OpenBlock};

/// Total supply, credited to the genesis representative.
pub const GENESIS_AMOUNT: Amount = Amount::MAX;

/// Seed of the well-known development genesis key. The live network genesis
/// key is generated at launch and discarded; dev/test use this fixed seed so
/// every node derives the same chain.
pub const DEV_GENESIS_SEED: [u8; 32] = [0xDA; 32];

/// The genesis key pair and its open block.
pub struct Genesis {
    pub key: KeyPair,
    pub block: Block,
}

impl Genesis {
    /// The deterministic development genesis.
    pub fn dev() -> Self {
        let key = keypair_from_seed(&DEV_GENESIS_SEED);
        let account = key.account();
        let block = Block::Open(OpenBlock::new(account.as_hash(), account, &key, 0));
        Self { key, block }
    }

    pub fn account(&self) -> Account {
        self.key.account()
    }

    pub fn hash(&self) -> BlockHash {
        self.block.hash()
    }
}

/// Per-network constants the ledger is parameterized over.
pub struct LedgerConstants {
    pub genesis_account: Account,
    pub genesis_block: Block,
    /// Link value marking a state block as an epoch block.
    pub epoch_link: BlockHash,
    /// The only key allowed to sign epoch blocks.
    pub epoch_signer: Account,
    pub work: WorkThresholds,
}

impl LedgerConstants {
    /// Development constants: dev genesis, zero work, epoch blocks signed by
    /// the genesis key.
    pub fn dev() -> Self {
        let genesis = Genesis::dev();
        Self {
            genesis_account: genesis.account(),
            epoch_signer: genesis.account(),
            epoch_link: dev_epoch_link(),
            genesis_block: genesis.block,
            work: WorkThresholds::dev(),
        }
    }
}

/// The development epoch link: an ASCII tag zero-padded to 32 bytes. It is
/// not the hash of any block, so a state block naming it can only be an
/// epoch block (or a receive of a source that will never exist).
pub fn dev_epoch_link() -> BlockHash {
    let mut bytes = [0u8; 32];
    bytes[..14].copy_from_slice(b"epoch v1 block");
    BlockHash::new(bytes)
}
