//! Fundamental types for the velo block-lattice.
//!
//! This crate defines the scalar types shared across every other crate in the
//! workspace: block hashes, account keys, amounts, epochs, timestamps, and
//! signature material.

pub mod account;
pub mod amount;
pub mod epoch;
pub mod hash;
pub mod keys;
pub mod time;

pub use account::Account;
pub use amount::Amount;
pub use epoch::Epoch;
pub use hash::BlockHash;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use time::Timestamp;
