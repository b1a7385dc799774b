//! Proof-of-work validation for velo blocks.
//!
//! Work is computed over a block's *root* (its previous hash, or the account
//! for open blocks) so a nonce can be precomputed before the block contents
//! are final.

pub mod generator;
pub mod thresholds;
pub mod validator;

pub use generator::generate_work;
pub use thresholds::WorkThresholds;
pub use validator::{validate_work, work_value};
