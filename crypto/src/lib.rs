//! Cryptographic primitives for the velo ledger.
//!
//! - **Ed25519** for block and vote signatures
//! - **Blake2b-256** for block hashes, vote digests, and proof-of-work

pub mod hash;
pub mod keys;
pub mod sign;

pub use hash::{blake2b_256, blake2b_256_multi};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};
