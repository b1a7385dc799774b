//! Per-root election state.

use std::collections::HashMap;

use velo_ledger::{Block, Ledger, LedgerError};
use velo_store::ReadTxn;
use velo_types::{Account, Amount, BlockHash, Timestamp};

/// A voter may not change their vote within this window, measured from their
/// previous vote in the same election.
pub const VOTE_COOLDOWN_SECS: u64 = 15;

/// The latest vote an election holds for one voter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteEntry {
    pub hash: BlockHash,
    pub sequence: u64,
    pub time: Timestamp,
}

/// Vote state for one root: candidate blocks and the latest vote per voter.
pub struct Election {
    pub root: BlockHash,
    blocks: HashMap<BlockHash, Block>,
    last_votes: HashMap<Account, VoteEntry>,
}

impl Election {
    /// Start an election seeded with the block that triggered it. A
    /// placeholder entry under the zero account records the local candidate,
    /// so `last_votes` is never empty.
    pub fn new(block: Block, now: Timestamp) -> Self {
        let hash = block.hash();
        let root = block.root();
        let mut last_votes = HashMap::new();
        last_votes.insert(
            Account::ZERO,
            VoteEntry {
                hash,
                sequence: 0,
                time: now,
            },
        );
        let mut blocks = HashMap::new();
        blocks.insert(hash, block);
        Self {
            root,
            blocks,
            last_votes,
        }
    }

    /// Record a vote. Returns `true` when the vote replaced (or created) the
    /// voter's entry: the sequence must be strictly higher than the previous
    /// one and the cooldown must have elapsed. Everything else is ignored.
    pub fn vote(&mut self, voter: Account, sequence: u64, block: Block, now: Timestamp) -> bool {
        let should_process = match self.last_votes.get(&voter) {
            None => true,
            Some(last) => {
                sequence > last.sequence && last.time.has_expired(VOTE_COOLDOWN_SECS, now)
            }
        };
        if !should_process {
            return false;
        }
        let hash = block.hash();
        self.last_votes.insert(
            voter,
            VoteEntry {
                hash,
                sequence,
                time: now,
            },
        );
        self.blocks.entry(hash).or_insert(block);
        true
    }

    /// Candidates ordered by total delegated weight behind them, heaviest
    /// first; ties broken by hash so the order is deterministic.
    pub fn tally(
        &self,
        txn: &dyn ReadTxn,
        ledger: &Ledger,
    ) -> Result<Vec<(Amount, Block)>, LedgerError> {
        let mut weights: HashMap<BlockHash, Amount> = HashMap::new();
        for (voter, entry) in &self.last_votes {
            let weight = ledger.weight(txn, voter)?;
            let sum = weights.entry(entry.hash).or_insert(Amount::ZERO);
            *sum = sum.saturating_add(weight);
        }
        let mut results: Vec<(Amount, Block)> = self
            .blocks
            .values()
            .map(|block| {
                let weight = weights.get(&block.hash()).copied().unwrap_or(Amount::ZERO);
                (weight, block.clone())
            })
            .collect();
        results.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.hash().cmp(&a.1.hash())));
        Ok(results)
    }

    pub fn last_votes(&self) -> &HashMap<Account, VoteEntry> {
        &self.last_votes
    }

    pub fn blocks(&self) -> &HashMap<BlockHash, Block> {
        &self.blocks
    }
}
