//! PoW validation.

use velo_crypto::blake2b_256;
use velo_types::BlockHash;

/// Compute the work value for a root/nonce pair.
///
/// Concatenates root + nonce LE bytes, hashes with Blake2b-256, and
/// interprets the first 8 bytes as a little-endian u64.
pub fn work_value(root: &BlockHash, nonce: u64) -> u64 {
    let mut input = [0u8; 40];
    input[0..32].copy_from_slice(root.as_bytes());
    input[32..40].copy_from_slice(&nonce.to_le_bytes());

    let hash = blake2b_256(&input);
    u64::from_le_bytes([
        hash[0], hash[1], hash[2], hash[3], hash[4], hash[5], hash[6], hash[7],
    ])
}

/// Validate that a work nonce meets the threshold for a given root.
pub fn validate_work(root: &BlockHash, nonce: u64, threshold: u64) -> bool {
    work_value(root, nonce) >= threshold
}
