//! The set of live elections, keyed by root.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use velo_ledger::{Block, Ledger, LedgerError};
use velo_store::ReadTxn;
use velo_types::{Amount, BlockHash, Timestamp};

use crate::election::Election;
use crate::vote::Vote;

/// Classification of an incoming vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteCode {
    /// Signature failed over the vote digest.
    Invalid,
    /// The vote did not advance any election (stale sequence, cooldown, or
    /// no election for its root).
    Replay,
    /// Accepted.
    Vote,
}

/// All live elections, behind one mutex. Weights are read from the ledger
/// through a read transaction at tally time only.
pub struct ActiveElections {
    ledger: Arc<Ledger>,
    roots: Mutex<HashMap<BlockHash, Election>>,
}

impl ActiveElections {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self {
            ledger,
            roots: Mutex::new(HashMap::new()),
        }
    }

    /// Start an election for a block's root. Returns `false` when one is
    /// already running.
    pub fn start(&self, block: Block, now: Timestamp) -> bool {
        let mut roots = self.roots.lock().unwrap();
        let root = block.root();
        if roots.contains_key(&root) {
            return false;
        }
        tracing::debug!(%root, block = %block.hash(), "starting election");
        roots.insert(root, Election::new(block, now));
        true
    }

    /// Route a vote to the election for its block's root.
    pub fn vote(&self, vote: &Vote, now: Timestamp) -> VoteCode {
        if !vote.validate() {
            return VoteCode::Invalid;
        }
        let mut roots = self.roots.lock().unwrap();
        let root = vote.block.root();
        match roots.get_mut(&root) {
            Some(election) => {
                if election.vote(vote.voter, vote.sequence, vote.block.clone(), now) {
                    VoteCode::Vote
                } else {
                    VoteCode::Replay
                }
            }
            None => VoteCode::Replay,
        }
    }

    /// Tally one election's candidates by weight, heaviest first.
    pub fn tally(
        &self,
        txn: &dyn ReadTxn,
        root: &BlockHash,
    ) -> Result<Option<Vec<(Amount, Block)>>, LedgerError> {
        let roots = self.roots.lock().unwrap();
        match roots.get(root) {
            Some(election) => Ok(Some(election.tally(txn, &self.ledger)?)),
            None => Ok(None),
        }
    }

    /// Inspect one election under the mutex.
    pub fn with_election<R>(&self, root: &BlockHash, f: impl FnOnce(&Election) -> R) -> Option<R> {
        let roots = self.roots.lock().unwrap();
        roots.get(root).map(f)
    }

    pub fn len(&self) -> usize {
        self.roots.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
