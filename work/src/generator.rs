//! PoW generation (CPU spin loop).
//!
//! Production work generation lives outside the core; this generator exists
//! so tests can mint valid nonces against low thresholds.

use crate::validator::validate_work;
use velo_types::BlockHash;

/// Generate a work nonce that meets the threshold for a root.
///
/// Iterates nonces sequentially; only suitable for low thresholds.
pub fn generate_work(root: &BlockHash, threshold: u64) -> u64 {
    let mut nonce = 0u64;
    while !validate_work(root, nonce, threshold) {
        nonce = nonce.wrapping_add(1);
    }
    nonce
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_valid_nonce() {
        let root = BlockHash::new([0xAB; 32]);
        let nonce = generate_work(&root, 1 << 20);
        assert!(validate_work(&root, nonce, 1 << 20));
    }

    #[test]
    fn zero_threshold_accepts_first_nonce() {
        let root = BlockHash::new([1u8; 32]);
        assert_eq!(generate_work(&root, 0), 0);
    }
}
