use proptest::prelude::*;

use velo_types::BlockHash;
use velo_work::{generate_work, validate_work, work_value};

proptest! {
    /// Generated PoW always passes its own validation.
    #[test]
    fn generated_pow_always_valid(
        root_byte in 0u8..=255,
        threshold in 0u64..50_000,
    ) {
        let root = BlockHash::new([root_byte; 32]);
        let nonce = generate_work(&root, threshold);
        prop_assert!(
            validate_work(&root, nonce, threshold),
            "generated nonce must pass validation"
        );
    }

    /// Zero threshold always passes regardless of nonce.
    #[test]
    fn zero_threshold_always_passes(
        root_bytes in prop::array::uniform32(0u8..),
        nonce in 0u64..1_000_000,
    ) {
        let root = BlockHash::new(root_bytes);
        prop_assert!(validate_work(&root, nonce, 0), "zero threshold must always pass");
    }

    /// Validation agrees with the computed work value at the boundary.
    #[test]
    fn validation_matches_work_value(
        root_bytes in prop::array::uniform32(0u8..),
        nonce in any::<u64>(),
        threshold in any::<u64>(),
    ) {
        let root = BlockHash::new(root_bytes);
        prop_assert_eq!(
            validate_work(&root, nonce, threshold),
            work_value(&root, nonce) >= threshold
        );
    }

    /// Validation is deterministic: same inputs produce same result.
    #[test]
    fn validation_is_deterministic(
        root_bytes in prop::array::uniform32(0u8..),
        nonce in any::<u64>(),
        threshold in any::<u64>(),
    ) {
        let root = BlockHash::new(root_bytes);
        prop_assert_eq!(
            validate_work(&root, nonce, threshold),
            validate_work(&root, nonce, threshold)
        );
    }
}
