//! The block-processing state machine.
//!
//! `process` classifies a candidate block as accepted (`Progress`), rejected
//! by a specific rule, or a fork, and applies accepted blocks to the store.
//! Every check runs before the first mutation, so a non-progress outcome
//! leaves the store untouched and the caller may keep the transaction open.

use velo_store::{AccountInfo, BlockSideband, PendingInfo, PendingKey, WriteTxn};
use velo_types::{Account, Amount, BlockHash, Epoch, Timestamp};
use velo_work::validate_work;

use crate::block::{Block, ChangeBlock, OpenBlock, ReceiveBlock, SendBlock, StateBlock};
use crate::error::LedgerError;
use crate::ledger::{verify_block_signature, Ledger};

/// Classification of a processed block. Closed set; callers branch on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Accepted and applied.
    Progress,
    /// Already in the ledger.
    Old,
    /// Signature does not verify against the signing account.
    BadSignature,
    /// A legacy send must strictly lower the balance.
    NegativeSpend,
    /// A sibling block already occupies this chain position.
    Fork,
    /// No matching pending claim (or the claim requires a state receive).
    Unreceivable,
    /// The previous block is not in the ledger yet.
    GapPrevious,
    /// The source/link block is not in the ledger yet.
    GapSource,
    /// The burn account cannot be opened.
    OpenedBurnAccount,
    /// A state block's balance delta contradicts its link.
    BalanceMismatch,
    /// An epoch block must carry the account's current representative.
    RepresentativeMismatch,
    /// Legacy block on a state-tipped chain, or a redundant epoch.
    BlockPosition,
    /// Proof-of-work below the threshold for the block's root.
    InsufficientWork,
}

/// Outcome of `Ledger::process`; `account` and `amount` are populated on
/// `Progress`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub code: ProcessResult,
    pub account: Option<Account>,
    pub amount: Option<Amount>,
}

impl ProcessOutcome {
    fn rejected(code: ProcessResult) -> Self {
        Self {
            code,
            account: None,
            amount: None,
        }
    }

    fn progress(account: Account, amount: Option<Amount>) -> Self {
        Self {
            code: ProcessResult::Progress,
            account: Some(account),
            amount,
        }
    }
}

impl Ledger {
    /// Run a candidate block through the state machine. Mutates the store
    /// only when the outcome is `Progress`; store faults are fatal and abort
    /// the enclosing transaction.
    pub fn process(&self, txn: &mut dyn WriteTxn, block: &Block) -> Result<ProcessOutcome, LedgerError> {
        if !validate_work(&block.root(), block.work(), self.constants.work.threshold) {
            return Ok(ProcessOutcome::rejected(ProcessResult::InsufficientWork));
        }
        if self.store().blocks().exists(txn.as_read(), &block.hash())? {
            return Ok(ProcessOutcome::rejected(ProcessResult::Old));
        }
        match block {
            Block::Send(send) => self.process_send(txn, block, send),
            Block::Receive(receive) => self.process_receive(txn, block, receive),
            Block::Open(open) => self.process_open(txn, block, open),
            Block::Change(change) => self.process_change(txn, block, change),
            Block::State(state) => self.process_state(txn, block, state),
        }
    }

    /// Resolve the chain a legacy block claims to extend. Returns the
    /// owning account and its record, or the rejection to report.
    fn legacy_preamble(
        &self,
        txn: &mut dyn WriteTxn,
        hash: &BlockHash,
        previous: &BlockHash,
        signature: &velo_types::Signature,
    ) -> Result<Result<(Account, AccountInfo), ProcessResult>, LedgerError> {
        let Some((prev_bytes, prev_sideband)) = self.store().blocks().get(txn.as_read(), previous)?
        else {
            return Ok(Err(ProcessResult::GapPrevious));
        };
        let account = prev_sideband.account;
        if !verify_block_signature(hash, signature, &account) {
            return Ok(Err(ProcessResult::BadSignature));
        }
        // A state tip closes the chain to legacy kinds.
        if matches!(Block::from_bytes(&prev_bytes)?, Block::State(_)) {
            return Ok(Err(ProcessResult::BlockPosition));
        }
        let info = self
            .store()
            .accounts()
            .get(txn.as_read(), &account)?
            .ok_or(LedgerError::AccountNotFound(account))?;
        if info.head != *previous {
            return Ok(Err(ProcessResult::Fork));
        }
        Ok(Ok((account, info)))
    }

    fn process_send(
        &self,
        txn: &mut dyn WriteTxn,
        block: &Block,
        send: &SendBlock,
    ) -> Result<ProcessOutcome, LedgerError> {
        let hash = block.hash();
        let (account, info) = match self.legacy_preamble(txn, &hash, &send.previous, &send.signature)? {
            Ok(found) => found,
            Err(code) => return Ok(ProcessOutcome::rejected(code)),
        };
        if send.balance >= info.balance {
            return Ok(ProcessOutcome::rejected(ProcessResult::NegativeSpend));
        }
        let amount = info.balance - send.balance;

        let rep = self.representative(txn.as_read(), &info.rep_block)?;
        self.store().rep_weights().sub(txn, &rep, amount)?;
        self.store().pending().put(
            txn,
            &PendingKey::new(send.destination, hash),
            &PendingInfo {
                source: account,
                amount,
                epoch: info.epoch,
            },
        )?;
        let now = Timestamp::now();
        let new_info = AccountInfo {
            head: hash,
            open_block: info.open_block,
            rep_block: info.rep_block,
            balance: send.balance,
            modified: now,
            block_count: info.block_count + 1,
            epoch: info.epoch,
        };
        let sideband = BlockSideband {
            account,
            successor: BlockHash::ZERO,
            balance: send.balance,
            height: info.block_count + 1,
            timestamp: now,
            epoch: info.epoch,
        };
        self.extend_chain(txn, &account, block, &new_info, &sideband)?;
        Ok(ProcessOutcome::progress(account, Some(amount)))
    }

    fn process_receive(
        &self,
        txn: &mut dyn WriteTxn,
        block: &Block,
        receive: &ReceiveBlock,
    ) -> Result<ProcessOutcome, LedgerError> {
        let hash = block.hash();
        let (account, info) =
            match self.legacy_preamble(txn, &hash, &receive.previous, &receive.signature)? {
                Ok(found) => found,
                Err(code) => return Ok(ProcessOutcome::rejected(code)),
            };
        if !self.store().blocks().exists(txn.as_read(), &receive.source)? {
            return Ok(ProcessOutcome::rejected(ProcessResult::GapSource));
        }
        let key = PendingKey::new(account, receive.source);
        let Some(pending) = self.store().pending().get(txn.as_read(), &key)? else {
            return Ok(ProcessOutcome::rejected(ProcessResult::Unreceivable));
        };
        // A claim sent under a later epoch can only be pocketed by a state
        // receive.
        if pending.epoch != Epoch::Epoch0 {
            return Ok(ProcessOutcome::rejected(ProcessResult::Unreceivable));
        }

        let rep = self.representative(txn.as_read(), &info.rep_block)?;
        self.store().rep_weights().add(txn, &rep, pending.amount)?;
        self.store().pending().del(txn, &key)?;
        let new_balance = info.balance.saturating_add(pending.amount);
        let now = Timestamp::now();
        let new_info = AccountInfo {
            head: hash,
            open_block: info.open_block,
            rep_block: info.rep_block,
            balance: new_balance,
            modified: now,
            block_count: info.block_count + 1,
            epoch: info.epoch,
        };
        let sideband = BlockSideband {
            account,
            successor: BlockHash::ZERO,
            balance: new_balance,
            height: info.block_count + 1,
            timestamp: now,
            epoch: info.epoch,
        };
        self.extend_chain(txn, &account, block, &new_info, &sideband)?;
        Ok(ProcessOutcome::progress(account, Some(pending.amount)))
    }

    fn process_open(
        &self,
        txn: &mut dyn WriteTxn,
        block: &Block,
        open: &OpenBlock,
    ) -> Result<ProcessOutcome, LedgerError> {
        let hash = block.hash();
        let account = open.account;
        if !verify_block_signature(&hash, &open.signature, &account) {
            return Ok(ProcessOutcome::rejected(ProcessResult::BadSignature));
        }
        if !self.store().blocks().exists(txn.as_read(), &open.source)? {
            return Ok(ProcessOutcome::rejected(ProcessResult::GapSource));
        }
        if self.store().accounts().get(txn.as_read(), &account)?.is_some() {
            return Ok(ProcessOutcome::rejected(ProcessResult::Fork));
        }
        if account == Account::ZERO {
            return Ok(ProcessOutcome::rejected(ProcessResult::OpenedBurnAccount));
        }
        let key = PendingKey::new(account, open.source);
        let Some(pending) = self.store().pending().get(txn.as_read(), &key)? else {
            return Ok(ProcessOutcome::rejected(ProcessResult::Unreceivable));
        };
        if pending.epoch != Epoch::Epoch0 {
            return Ok(ProcessOutcome::rejected(ProcessResult::Unreceivable));
        }

        self.store()
            .rep_weights()
            .add(txn, &open.representative, pending.amount)?;
        self.store().pending().del(txn, &key)?;
        let now = Timestamp::now();
        let new_info = AccountInfo {
            head: hash,
            open_block: hash,
            rep_block: hash,
            balance: pending.amount,
            modified: now,
            block_count: 1,
            epoch: Epoch::Epoch0,
        };
        let sideband = BlockSideband {
            account,
            successor: BlockHash::ZERO,
            balance: pending.amount,
            height: 1,
            timestamp: now,
            epoch: Epoch::Epoch0,
        };
        self.extend_chain(txn, &account, block, &new_info, &sideband)?;
        Ok(ProcessOutcome::progress(account, Some(pending.amount)))
    }

    fn process_change(
        &self,
        txn: &mut dyn WriteTxn,
        block: &Block,
        change: &ChangeBlock,
    ) -> Result<ProcessOutcome, LedgerError> {
        let hash = block.hash();
        let (account, info) =
            match self.legacy_preamble(txn, &hash, &change.previous, &change.signature)? {
                Ok(found) => found,
                Err(code) => return Ok(ProcessOutcome::rejected(code)),
            };

        let old_rep = self.representative(txn.as_read(), &info.rep_block)?;
        self.store().rep_weights().sub(txn, &old_rep, info.balance)?;
        self.store()
            .rep_weights()
            .add(txn, &change.representative, info.balance)?;
        let now = Timestamp::now();
        let new_info = AccountInfo {
            head: hash,
            open_block: info.open_block,
            rep_block: hash,
            balance: info.balance,
            modified: now,
            block_count: info.block_count + 1,
            epoch: info.epoch,
        };
        let sideband = BlockSideband {
            account,
            successor: BlockHash::ZERO,
            balance: info.balance,
            height: info.block_count + 1,
            timestamp: now,
            epoch: info.epoch,
        };
        self.extend_chain(txn, &account, block, &new_info, &sideband)?;
        Ok(ProcessOutcome::progress(account, None))
    }

    fn process_state(
        &self,
        txn: &mut dyn WriteTxn,
        block: &Block,
        state: &StateBlock,
    ) -> Result<ProcessOutcome, LedgerError> {
        let hash = block.hash();
        // An epoch block is a state block naming the epoch link and signed
        // by the epoch key. Any other signer makes the link an ordinary
        // receive source.
        if state.link == self.constants.epoch_link
            && verify_block_signature(&hash, &state.signature, &self.constants.epoch_signer)
        {
            return self.process_epoch(txn, block, state);
        }
        if !verify_block_signature(&hash, &state.signature, &state.account) {
            return Ok(ProcessOutcome::rejected(ProcessResult::BadSignature));
        }
        self.process_state_block(txn, block, state)
    }

    fn process_state_block(
        &self,
        txn: &mut dyn WriteTxn,
        block: &Block,
        state: &StateBlock,
    ) -> Result<ProcessOutcome, LedgerError> {
        let hash = block.hash();
        let info_opt = self.store().accounts().get(txn.as_read(), &state.account)?;

        let mut is_send = false;
        let mut amount = state.balance;
        let prev_epoch;
        match &info_opt {
            Some(info) => {
                // A second open for an existing account competes with the
                // first regardless of kind.
                if state.previous.is_zero() {
                    return Ok(ProcessOutcome::rejected(ProcessResult::Fork));
                }
                if !self.store().blocks().exists(txn.as_read(), &state.previous)? {
                    return Ok(ProcessOutcome::rejected(ProcessResult::GapPrevious));
                }
                if info.head != state.previous {
                    return Ok(ProcessOutcome::rejected(ProcessResult::Fork));
                }
                is_send = state.balance < info.balance;
                amount = if is_send {
                    info.balance - state.balance
                } else {
                    state.balance - info.balance
                };
                prev_epoch = info.epoch;
            }
            None => {
                if !state.previous.is_zero() {
                    return Ok(ProcessOutcome::rejected(ProcessResult::GapPrevious));
                }
                // A first block must pocket a send.
                if state.link.is_zero() {
                    return Ok(ProcessOutcome::rejected(ProcessResult::GapSource));
                }
                prev_epoch = Epoch::Epoch0;
            }
        }

        let mut epoch = prev_epoch;
        if !is_send {
            if !state.link.is_zero() {
                if !self.store().blocks().exists(txn.as_read(), &state.link)? {
                    return Ok(ProcessOutcome::rejected(ProcessResult::GapSource));
                }
                let key = PendingKey::new(state.account, state.link);
                let Some(pending) = self.store().pending().get(txn.as_read(), &key)? else {
                    return Ok(ProcessOutcome::rejected(ProcessResult::Unreceivable));
                };
                if amount != pending.amount {
                    return Ok(ProcessOutcome::rejected(ProcessResult::BalanceMismatch));
                }
                // Pocketing an upgraded claim upgrades the receiver.
                if pending.epoch > epoch {
                    epoch = pending.epoch;
                }
            } else if !amount.is_zero() {
                // No link: only the representative may change.
                return Ok(ProcessOutcome::rejected(ProcessResult::BalanceMismatch));
            }
        }

        if let Some(info) = &info_opt {
            let old_rep = self.representative(txn.as_read(), &info.rep_block)?;
            self.store().rep_weights().sub(txn, &old_rep, info.balance)?;
        }
        self.store()
            .rep_weights()
            .add(txn, &state.representative, state.balance)?;
        if is_send {
            self.store().pending().put(
                txn,
                &PendingKey::new(state.link.as_account(), hash),
                &PendingInfo {
                    source: state.account,
                    amount,
                    epoch: prev_epoch,
                },
            )?;
        } else if !state.link.is_zero() {
            self.store()
                .pending()
                .del(txn, &PendingKey::new(state.account, state.link))?;
        }

        let now = Timestamp::now();
        let height = info_opt.as_ref().map(|i| i.block_count).unwrap_or(0) + 1;
        let open_block = info_opt.as_ref().map(|i| i.open_block).unwrap_or(hash);
        let new_info = AccountInfo {
            head: hash,
            open_block,
            rep_block: hash,
            balance: state.balance,
            modified: now,
            block_count: height,
            epoch,
        };
        let sideband = BlockSideband {
            account: state.account,
            successor: BlockHash::ZERO,
            balance: state.balance,
            height,
            timestamp: now,
            epoch,
        };
        self.extend_chain(txn, &state.account, block, &new_info, &sideband)?;
        Ok(ProcessOutcome::progress(state.account, Some(amount)))
    }

    fn process_epoch(
        &self,
        txn: &mut dyn WriteTxn,
        block: &Block,
        state: &StateBlock,
    ) -> Result<ProcessOutcome, LedgerError> {
        let hash = block.hash();
        let now = Timestamp::now();
        match self.store().accounts().get(txn.as_read(), &state.account)? {
            Some(info) => {
                if state.previous.is_zero() {
                    return Ok(ProcessOutcome::rejected(ProcessResult::Fork));
                }
                if !self.store().blocks().exists(txn.as_read(), &state.previous)? {
                    return Ok(ProcessOutcome::rejected(ProcessResult::GapPrevious));
                }
                if info.head != state.previous {
                    return Ok(ProcessOutcome::rejected(ProcessResult::Fork));
                }
                if info.epoch != Epoch::Epoch0 {
                    return Ok(ProcessOutcome::rejected(ProcessResult::BlockPosition));
                }
                if state.balance != info.balance {
                    return Ok(ProcessOutcome::rejected(ProcessResult::BalanceMismatch));
                }
                let current_rep = self.representative(txn.as_read(), &info.rep_block)?;
                if state.representative != current_rep {
                    return Ok(ProcessOutcome::rejected(ProcessResult::RepresentativeMismatch));
                }

                // No value moves and the representative is unchanged; only
                // the epoch bumps.
                let new_info = AccountInfo {
                    head: hash,
                    open_block: info.open_block,
                    rep_block: hash,
                    balance: info.balance,
                    modified: now,
                    block_count: info.block_count + 1,
                    epoch: Epoch::Epoch1,
                };
                let sideband = BlockSideband {
                    account: state.account,
                    successor: BlockHash::ZERO,
                    balance: info.balance,
                    height: info.block_count + 1,
                    timestamp: now,
                    epoch: Epoch::Epoch1,
                };
                self.extend_chain(txn, &state.account, block, &new_info, &sideband)?;
                Ok(ProcessOutcome::progress(state.account, None))
            }
            None => {
                if !state.previous.is_zero() {
                    return Ok(ProcessOutcome::rejected(ProcessResult::GapPrevious));
                }
                // An epoch block may open an account only in the degenerate
                // zero form: no funds, no representative.
                if !state.representative.is_zero() {
                    return Ok(ProcessOutcome::rejected(ProcessResult::RepresentativeMismatch));
                }
                if !state.balance.is_zero() {
                    return Ok(ProcessOutcome::rejected(ProcessResult::BalanceMismatch));
                }
                let new_info = AccountInfo {
                    head: hash,
                    open_block: hash,
                    rep_block: hash,
                    balance: Amount::ZERO,
                    modified: now,
                    block_count: 1,
                    epoch: Epoch::Epoch1,
                };
                let sideband = BlockSideband {
                    account: state.account,
                    successor: BlockHash::ZERO,
                    balance: Amount::ZERO,
                    height: 1,
                    timestamp: now,
                    epoch: Epoch::Epoch1,
                };
                self.extend_chain(txn, &state.account, block, &new_info, &sideband)?;
                Ok(ProcessOutcome::progress(state.account, None))
            }
        }
    }
}
