//! The velo block-lattice ledger.
//!
//! Every account owns its own chain; value moves with a send block on the
//! sender's chain and a matching receive (or open) block on the recipient's.
//! This crate holds the block model, the block-processing state machine, the
//! rollback engine, the representative weight index, and the checksum.

pub mod block;
pub mod error;
pub mod genesis;
pub mod ledger;
pub mod processor;
pub mod rollback;

pub use block::{Block, ChangeBlock, OpenBlock, ReceiveBlock, SendBlock, StateBlock};
pub use error::LedgerError;
pub use genesis::{Genesis, LedgerConstants, GENESIS_AMOUNT};
pub use ledger::Ledger;
pub use processor::{ProcessOutcome, ProcessResult};
