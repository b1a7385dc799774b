//! Vote aggregation for competing blocks.
//!
//! An election collects the latest vote of every voter for blocks sharing a
//! root; the tally orders candidates by the delegated weight behind them.
//! Election state lives in memory behind a single mutex; weights are read
//! from the ledger at tally time.

pub mod active;
pub mod election;
pub mod vote;

pub use active::{ActiveElections, VoteCode};
pub use election::{Election, VoteEntry, VOTE_COOLDOWN_SECS};
pub use vote::Vote;
