//! The ledger: bookkeeping over the abstract store.
//!
//! Owns the store handle and the ledger constants, and exposes the queries
//! shared by the processor, the rollback engine, and external callers. The
//! state machine itself lives in `processor`; undo lives in `rollback`.

use std::collections::HashMap;
use std::sync::Arc;

use velo_crypto::verify_signature;
use velo_store::{AccountInfo, BlockSideband, PendingKey, ReadTxn, Store, WriteTxn};
use velo_types::{Account, Amount, BlockHash, Epoch, PublicKey, Signature, Timestamp};

use crate::block::{Block, StateBlock};
use crate::error::LedgerError;
use crate::genesis::{LedgerConstants, GENESIS_AMOUNT};

/// The core ledger engine.
pub struct Ledger {
    store: Arc<dyn Store>,
    pub constants: LedgerConstants,
    /// While the total block count is below this, `weight` consults
    /// `bootstrap_weights` before the tracked index.
    pub bootstrap_weight_max_blocks: u64,
    pub bootstrap_weights: HashMap<Account, Amount>,
}

impl Ledger {
    pub fn new(store: Arc<dyn Store>, constants: LedgerConstants) -> Self {
        Self {
            store,
            constants,
            bootstrap_weight_max_blocks: 0,
            bootstrap_weights: HashMap::new(),
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Seed the store with the genesis block: account record, frontier, the
    /// full supply delegated to the genesis representative, and the genesis
    /// hash folded into the checksum.
    pub fn initialize(&self, txn: &mut dyn WriteTxn) -> Result<(), LedgerError> {
        let block = self.constants.genesis_block.clone();
        let hash = block.hash();
        let account = self.constants.genesis_account;
        let now = Timestamp::now();
        let sideband = BlockSideband {
            account,
            successor: BlockHash::ZERO,
            balance: GENESIS_AMOUNT,
            height: 1,
            timestamp: now,
            epoch: Epoch::Epoch0,
        };
        self.store
            .blocks()
            .put(txn, &hash, &block.to_bytes(), &sideband)?;
        let info = AccountInfo {
            head: hash,
            open_block: hash,
            rep_block: hash,
            balance: GENESIS_AMOUNT,
            modified: now,
            block_count: 1,
            epoch: Epoch::Epoch0,
        };
        self.store.accounts().put(txn, &account, &info)?;
        self.store.frontiers().put(txn, &hash, &account)?;
        self.store.rep_weights().add(txn, &account, GENESIS_AMOUNT)?;
        self.checksum_update(txn, &hash)?;
        Ok(())
    }

    // ── Weight index ────────────────────────────────────────────────────

    /// A representative's voting weight, honoring the bootstrap override
    /// while the chain is still shorter than `bootstrap_weight_max_blocks`.
    pub fn weight(&self, txn: &dyn ReadTxn, account: &Account) -> Result<Amount, LedgerError> {
        if self.bootstrap_weight_max_blocks > 0
            && self.store.blocks().count(txn)? < self.bootstrap_weight_max_blocks
        {
            if let Some(weight) = self.bootstrap_weights.get(account) {
                tracing::trace!(%account, "serving bootstrap weight override");
                return Ok(*weight);
            }
        }
        Ok(self.store.rep_weights().get(txn, account)?)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Confirmed balance of an account; zero when unopened.
    pub fn account_balance(&self, txn: &dyn ReadTxn, account: &Account) -> Result<Amount, LedgerError> {
        Ok(self
            .store
            .accounts()
            .get(txn, account)?
            .map(|info| info.balance)
            .unwrap_or(Amount::ZERO))
    }

    /// Sum of claims pending for an account.
    pub fn account_pending(&self, txn: &dyn ReadTxn, account: &Account) -> Result<Amount, LedgerError> {
        Ok(self.store.pending().total_for(txn, account)?)
    }

    /// Balance settled by a specific block.
    pub fn balance(&self, txn: &dyn ReadTxn, hash: &BlockHash) -> Result<Amount, LedgerError> {
        let sideband = self
            .store
            .blocks()
            .sideband(txn, hash)?
            .ok_or(LedgerError::BlockNotFound(*hash))?;
        Ok(sideband.balance)
    }

    /// Value moved by a block: the magnitude of its balance delta.
    pub fn amount(&self, txn: &dyn ReadTxn, hash: &BlockHash) -> Result<Amount, LedgerError> {
        let (bytes, sideband) = self
            .store
            .blocks()
            .get(txn, hash)?
            .ok_or(LedgerError::BlockNotFound(*hash))?;
        let block = Block::from_bytes(&bytes)?;
        let previous = block.previous();
        let prev_balance = if previous.is_zero() {
            Amount::ZERO
        } else {
            self.balance(txn, &previous)?
        };
        Ok(if sideband.balance >= prev_balance {
            sideband.balance - prev_balance
        } else {
            prev_balance - sideband.balance
        })
    }

    /// The account a block belongs to.
    pub fn account(&self, txn: &dyn ReadTxn, hash: &BlockHash) -> Result<Account, LedgerError> {
        let sideband = self
            .store
            .blocks()
            .sideband(txn, hash)?
            .ok_or(LedgerError::BlockNotFound(*hash))?;
        Ok(sideband.account)
    }

    /// Head block of an account chain.
    pub fn latest(&self, txn: &dyn ReadTxn, account: &Account) -> Result<Option<BlockHash>, LedgerError> {
        Ok(self
            .store
            .accounts()
            .get(txn, account)?
            .map(|info| info.head))
    }

    /// Root the account's next block must use: its head, or the account
    /// identifier when the chain is unopened.
    pub fn latest_root(&self, txn: &dyn ReadTxn, account: &Account) -> Result<BlockHash, LedgerError> {
        Ok(match self.store.accounts().get(txn, account)? {
            Some(info) => info.head,
            None => account.as_hash(),
        })
    }

    /// The block following a root: the next block on the chain, or the open
    /// block when the root is an account identifier.
    pub fn successor(&self, txn: &dyn ReadTxn, root: &BlockHash) -> Result<Option<Block>, LedgerError> {
        let successor_hash = match self.store.blocks().sideband(txn, root)? {
            Some(sideband) => {
                if sideband.successor.is_zero() {
                    return Ok(None);
                }
                sideband.successor
            }
            None => match self.store.accounts().get(txn, &root.as_account())? {
                Some(info) => info.open_block,
                None => return Ok(None),
            },
        };
        let (bytes, _) = self
            .store
            .blocks()
            .get(txn, &successor_hash)?
            .ok_or(LedgerError::BlockNotFound(successor_hash))?;
        Ok(Some(Block::from_bytes(&bytes)?))
    }

    /// Walk back from `hash` to the nearest block that names a
    /// representative (open, change, or state).
    pub fn representative_block(&self, txn: &dyn ReadTxn, hash: &BlockHash) -> Result<BlockHash, LedgerError> {
        let mut current = *hash;
        loop {
            let (bytes, _) = self
                .store
                .blocks()
                .get(txn, &current)?
                .ok_or(LedgerError::BlockNotFound(current))?;
            match Block::from_bytes(&bytes)? {
                Block::Open(_) | Block::Change(_) | Block::State(_) => return Ok(current),
                Block::Send(b) => current = b.previous,
                Block::Receive(b) => current = b.previous,
            }
        }
    }

    /// The representative in force at `hash`.
    pub fn representative(&self, txn: &dyn ReadTxn, hash: &BlockHash) -> Result<Account, LedgerError> {
        let rep_hash = self.representative_block(txn, hash)?;
        let (bytes, _) = self
            .store
            .blocks()
            .get(txn, &rep_hash)?
            .ok_or(LedgerError::BlockNotFound(rep_hash))?;
        match Block::from_bytes(&bytes)? {
            Block::Open(b) => Ok(b.representative),
            Block::Change(b) => Ok(b.representative),
            Block::State(b) => Ok(b.representative),
            _ => Err(LedgerError::MalformedBlock(
                "representative walk ended on a non-representative block".into(),
            )),
        }
    }

    /// The account a block pays, if it moves value outward.
    pub fn block_destination(&self, txn: &dyn ReadTxn, block: &Block) -> Result<Option<Account>, LedgerError> {
        match block {
            Block::Send(b) => Ok(Some(b.destination)),
            Block::State(b) if self.is_send_state(txn, b)? => Ok(Some(b.link.as_account())),
            _ => Ok(None),
        }
    }

    /// The send hash a block pockets, if it receives value.
    pub fn block_source(&self, txn: &dyn ReadTxn, block: &Block) -> Result<Option<BlockHash>, LedgerError> {
        match block {
            Block::Receive(b) => Ok(Some(b.source)),
            Block::Open(b) => Ok(Some(b.source)),
            Block::State(b)
                if !b.link.is_zero()
                    && b.link != self.constants.epoch_link
                    && !self.is_send_state(txn, b)? =>
            {
                Ok(Some(b.link))
            }
            _ => Ok(None),
        }
    }

    /// Whether every block this block depends on is already in the store.
    pub fn could_fit(&self, txn: &dyn ReadTxn, block: &Block) -> Result<bool, LedgerError> {
        let previous = block.previous();
        if !previous.is_zero() && !self.store.blocks().exists(txn, &previous)? {
            return Ok(false);
        }
        match block {
            Block::Receive(b) => Ok(self.store.blocks().exists(txn, &b.source)?),
            Block::Open(b) => Ok(self.store.blocks().exists(txn, &b.source)?),
            Block::State(b) => {
                if !b.link.is_zero()
                    && b.link != self.constants.epoch_link
                    && !self.is_send_state(txn, b)?
                {
                    return Ok(self.store.blocks().exists(txn, &b.link)?);
                }
                Ok(true)
            }
            _ => Ok(true),
        }
    }

    /// Whether a state block lowers its account balance. Callable only once
    /// the previous block is present; unopened accounts never send.
    pub(crate) fn is_send_state(&self, txn: &dyn ReadTxn, block: &StateBlock) -> Result<bool, LedgerError> {
        if block.previous.is_zero() {
            return Ok(false);
        }
        let prev_balance = self.balance(txn, &block.previous)?;
        Ok(block.balance < prev_balance)
    }

    // ── Checksum ────────────────────────────────────────────────────────

    /// XOR of all bucket folds whose hash range intersects `[lower, upper]`.
    pub fn checksum(&self, txn: &dyn ReadTxn, lower: &BlockHash, upper: &BlockHash) -> Result<BlockHash, LedgerError> {
        let mut result = BlockHash::ZERO;
        for bucket in lower.as_bytes()[0]..=upper.as_bytes()[0] {
            let fold = self.store.checksums().get(txn, bucket)?;
            result = xor_hashes(&result, &fold);
        }
        Ok(result)
    }

    /// Fold a block hash into its bucket. XOR is self-inverse, so folding
    /// the same hash again removes it.
    pub(crate) fn checksum_update(&self, txn: &mut dyn WriteTxn, hash: &BlockHash) -> Result<(), LedgerError> {
        let bucket = hash.as_bytes()[0];
        let current = self.store.checksums().get(txn.as_read(), bucket)?;
        let folded = xor_hashes(&current, hash);
        self.store.checksums().put(txn, bucket, &folded)?;
        Ok(())
    }

    // ── Chain bookkeeping shared by processor and rollback ──────────────

    /// Append an accepted block: store it, repoint successor and frontier,
    /// fold the checksum, and publish the new account record.
    pub(crate) fn extend_chain(
        &self,
        txn: &mut dyn WriteTxn,
        account: &Account,
        block: &Block,
        info: &AccountInfo,
        sideband: &BlockSideband,
    ) -> Result<(), LedgerError> {
        let hash = block.hash();
        self.store
            .blocks()
            .put(txn, &hash, &block.to_bytes(), sideband)?;
        let previous = block.previous();
        if !previous.is_zero() {
            self.store.blocks().set_successor(txn, &previous, hash)?;
            self.store.frontiers().del(txn, &previous)?;
        }
        self.store.frontiers().put(txn, &hash, account)?;
        self.checksum_update(txn, &hash)?;
        self.store.accounts().put(txn, account, info)?;
        Ok(())
    }

    /// Remove a chain tip: delete the block, restore the previous tip's
    /// frontier and successor, unfold the checksum, and publish the restored
    /// account record.
    pub(crate) fn shrink_chain(
        &self,
        txn: &mut dyn WriteTxn,
        account: &Account,
        hash: &BlockHash,
        previous: &BlockHash,
        info: &AccountInfo,
    ) -> Result<(), LedgerError> {
        self.store.blocks().del(txn, hash)?;
        self.store.frontiers().del(txn, hash)?;
        self.store.frontiers().put(txn, previous, account)?;
        self.store
            .blocks()
            .set_successor(txn, previous, BlockHash::ZERO)?;
        self.checksum_update(txn, hash)?;
        self.store.accounts().put(txn, account, info)?;
        Ok(())
    }

    /// Delete an account entirely (rollback of its open block).
    pub(crate) fn remove_account(
        &self,
        txn: &mut dyn WriteTxn,
        account: &Account,
        hash: &BlockHash,
    ) -> Result<(), LedgerError> {
        self.store.blocks().del(txn, hash)?;
        self.store.frontiers().del(txn, hash)?;
        self.checksum_update(txn, hash)?;
        self.store.accounts().del(txn, account)?;
        Ok(())
    }

    /// Restore the pending claim a receive consumed, reconstructing its
    /// amount and epoch from the source block's sideband.
    pub(crate) fn restore_pending(
        &self,
        txn: &mut dyn WriteTxn,
        destination: &Account,
        source: &BlockHash,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let source_sideband = self
            .store
            .blocks()
            .sideband(txn.as_read(), source)?
            .ok_or(LedgerError::BlockNotFound(*source))?;
        self.store.pending().put(
            txn,
            &PendingKey::new(*destination, *source),
            &velo_store::PendingInfo {
                source: source_sideband.account,
                amount,
                epoch: source_sideband.epoch,
            },
        )?;
        Ok(())
    }
}

/// Bitwise XOR of two hashes.
pub(crate) fn xor_hashes(a: &BlockHash, b: &BlockHash) -> BlockHash {
    let mut out = [0u8; 32];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = a.as_bytes()[i] ^ b.as_bytes()[i];
    }
    BlockHash::new(out)
}

/// Verify a block signature against the signing account's key.
pub(crate) fn verify_block_signature(hash: &BlockHash, signature: &Signature, signer: &Account) -> bool {
    verify_signature(hash.as_bytes(), signature, &PublicKey(*signer.as_bytes()))
}
