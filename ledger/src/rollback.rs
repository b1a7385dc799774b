//! The rollback engine.
//!
//! Undoes the most recent blocks of an account chain, head first, until the
//! requested block is gone. Undoing a send whose claim was already pocketed
//! first rolls the recipient's chain back past the pocketing block, so the
//! cascade is bounded by chain depth.

use velo_store::{AccountInfo, PendingKey, WriteTxn};
use velo_types::{Account, Amount, BlockHash, Timestamp};

use crate::block::{Block, ChangeBlock, OpenBlock, ReceiveBlock, SendBlock, StateBlock};
use crate::error::LedgerError;
use crate::ledger::Ledger;

impl Ledger {
    /// Undo every block on `hash`'s account chain from the current head back
    /// through and including `hash`. The block must exist; a missing block
    /// is a caller error and the enclosing transaction should be aborted.
    pub fn rollback(&self, txn: &mut dyn WriteTxn, hash: &BlockHash) -> Result<(), LedgerError> {
        let sideband = self
            .store()
            .blocks()
            .sideband(txn.as_read(), hash)?
            .ok_or(LedgerError::BlockNotFound(*hash))?;
        let account = sideband.account;
        tracing::debug!(block = %hash, %account, "rolling back chain");
        while self.store().blocks().exists(txn.as_read(), hash)? {
            let info = self
                .store()
                .accounts()
                .get(txn.as_read(), &account)?
                .ok_or(LedgerError::AccountNotFound(account))?;
            let head = info.head;
            let (bytes, _) = self
                .store()
                .blocks()
                .get(txn.as_read(), &head)?
                .ok_or(LedgerError::BlockNotFound(head))?;
            match Block::from_bytes(&bytes)? {
                Block::Send(b) => self.undo_send(txn, &account, &head, &b, &info)?,
                Block::Receive(b) => self.undo_receive(txn, &account, &head, &b, &info)?,
                Block::Open(b) => self.undo_open(txn, &head, &b, &info)?,
                Block::Change(b) => self.undo_change(txn, &account, &head, &b, &info)?,
                Block::State(b) => self.undo_state(txn, &head, &b, &info)?,
            }
        }
        Ok(())
    }

    /// Undo the claim a send created. If the destination already pocketed
    /// it, roll the destination's chain back until the claim reappears.
    fn reclaim_pending(&self, txn: &mut dyn WriteTxn, key: &PendingKey) -> Result<(), LedgerError> {
        while !self.store().pending().exists(txn.as_read(), key)? {
            let destination_head = self
                .latest(txn.as_read(), &key.destination)?
                .ok_or(LedgerError::AccountNotFound(key.destination))?;
            self.rollback(txn, &destination_head)?;
        }
        self.store().pending().del(txn, key)?;
        Ok(())
    }

    fn undo_send(
        &self,
        txn: &mut dyn WriteTxn,
        account: &Account,
        hash: &BlockHash,
        send: &SendBlock,
        info: &AccountInfo,
    ) -> Result<(), LedgerError> {
        let prev_sideband = self
            .store()
            .blocks()
            .sideband(txn.as_read(), &send.previous)?
            .ok_or(LedgerError::BlockNotFound(send.previous))?;
        let amount = prev_sideband.balance.saturating_sub(info.balance);

        self.reclaim_pending(txn, &PendingKey::new(send.destination, *hash))?;
        let rep = self.representative(txn.as_read(), &info.rep_block)?;
        self.store().rep_weights().add(txn, &rep, amount)?;

        let new_info = AccountInfo {
            head: send.previous,
            open_block: info.open_block,
            rep_block: info.rep_block,
            balance: prev_sideband.balance,
            modified: Timestamp::now(),
            block_count: info.block_count - 1,
            epoch: prev_sideband.epoch,
        };
        self.shrink_chain(txn, account, hash, &send.previous, &new_info)
    }

    fn undo_receive(
        &self,
        txn: &mut dyn WriteTxn,
        account: &Account,
        hash: &BlockHash,
        receive: &ReceiveBlock,
        info: &AccountInfo,
    ) -> Result<(), LedgerError> {
        let prev_sideband = self
            .store()
            .blocks()
            .sideband(txn.as_read(), &receive.previous)?
            .ok_or(LedgerError::BlockNotFound(receive.previous))?;
        let amount = info.balance.saturating_sub(prev_sideband.balance);

        let rep = self.representative(txn.as_read(), &info.rep_block)?;
        self.store().rep_weights().sub(txn, &rep, amount)?;
        self.restore_pending(txn, account, &receive.source, amount)?;

        let new_info = AccountInfo {
            head: receive.previous,
            open_block: info.open_block,
            rep_block: info.rep_block,
            balance: prev_sideband.balance,
            modified: Timestamp::now(),
            block_count: info.block_count - 1,
            epoch: prev_sideband.epoch,
        };
        self.shrink_chain(txn, account, hash, &receive.previous, &new_info)
    }

    fn undo_open(
        &self,
        txn: &mut dyn WriteTxn,
        hash: &BlockHash,
        open: &OpenBlock,
        info: &AccountInfo,
    ) -> Result<(), LedgerError> {
        let amount = info.balance;
        self.store()
            .rep_weights()
            .sub(txn, &open.representative, amount)?;
        self.restore_pending(txn, &open.account, &open.source, amount)?;
        self.remove_account(txn, &open.account, hash)
    }

    fn undo_change(
        &self,
        txn: &mut dyn WriteTxn,
        account: &Account,
        hash: &BlockHash,
        change: &ChangeBlock,
        info: &AccountInfo,
    ) -> Result<(), LedgerError> {
        let previous_rep = self.representative(txn.as_read(), &change.previous)?;
        self.store()
            .rep_weights()
            .sub(txn, &change.representative, info.balance)?;
        self.store()
            .rep_weights()
            .add(txn, &previous_rep, info.balance)?;

        let prev_sideband = self
            .store()
            .blocks()
            .sideband(txn.as_read(), &change.previous)?
            .ok_or(LedgerError::BlockNotFound(change.previous))?;
        let new_info = AccountInfo {
            head: change.previous,
            open_block: info.open_block,
            rep_block: self.representative_block(txn.as_read(), &change.previous)?,
            balance: info.balance,
            modified: Timestamp::now(),
            block_count: info.block_count - 1,
            epoch: prev_sideband.epoch,
        };
        self.shrink_chain(txn, account, hash, &change.previous, &new_info)
    }

    fn undo_state(
        &self,
        txn: &mut dyn WriteTxn,
        hash: &BlockHash,
        state: &StateBlock,
        info: &AccountInfo,
    ) -> Result<(), LedgerError> {
        let prev_balance = if state.previous.is_zero() {
            Amount::ZERO
        } else {
            self.balance(txn.as_read(), &state.previous)?
        };
        let is_send = state.balance < prev_balance;

        self.store()
            .rep_weights()
            .sub(txn, &state.representative, state.balance)?;
        if !state.previous.is_zero() {
            let previous_rep = self.representative(txn.as_read(), &state.previous)?;
            self.store()
                .rep_weights()
                .add(txn, &previous_rep, prev_balance)?;
        }

        if is_send {
            self.reclaim_pending(txn, &PendingKey::new(state.link.as_account(), *hash))?;
        } else if !state.link.is_zero() && state.link != self.constants.epoch_link {
            let amount = state.balance.saturating_sub(prev_balance);
            self.restore_pending(txn, &state.account, &state.link, amount)?;
        }

        if state.previous.is_zero() {
            self.remove_account(txn, &state.account, hash)
        } else {
            let prev_sideband = self
                .store()
                .blocks()
                .sideband(txn.as_read(), &state.previous)?
                .ok_or(LedgerError::BlockNotFound(state.previous))?;
            let new_info = AccountInfo {
                head: state.previous,
                open_block: info.open_block,
                rep_block: self.representative_block(txn.as_read(), &state.previous)?,
                balance: prev_balance,
                modified: Timestamp::now(),
                block_count: info.block_count - 1,
                epoch: prev_sideband.epoch,
            };
            self.shrink_chain(txn, &state.account, hash, &state.previous, &new_info)
        }
    }
}
