use proptest::prelude::*;

use velo_types::{Account, Amount, BlockHash, Epoch, Timestamp};

proptest! {
    /// BlockHash roundtrip: new -> as_bytes -> new produces identical hash.
    #[test]
    fn block_hash_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = BlockHash::new(bytes);
        prop_assert_eq!(hash.as_bytes(), &bytes);
    }

    /// BlockHash::is_zero is true only for all-zero bytes.
    #[test]
    fn block_hash_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let hash = BlockHash::new(bytes);
        prop_assert_eq!(hash.is_zero(), bytes == [0u8; 32]);
    }

    /// Hash/account reinterpretation preserves the underlying bytes both ways.
    #[test]
    fn hash_account_union_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = BlockHash::new(bytes);
        prop_assert_eq!(hash.as_account().as_hash(), hash);
        let account = Account::new(bytes);
        prop_assert_eq!(account.as_hash().as_account(), account);
    }

    /// BlockHash bincode serialization roundtrip.
    #[test]
    fn block_hash_bincode_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = BlockHash::new(bytes);
        let encoded = bincode::serialize(&hash).unwrap();
        let decoded: BlockHash = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded.as_bytes(), hash.as_bytes());
    }

    /// Amount big-endian byte roundtrip.
    #[test]
    fn amount_be_bytes_roundtrip(raw in 0u128..u128::MAX) {
        let amount = Amount::new(raw);
        prop_assert_eq!(Amount::from_be_bytes(amount.to_be_bytes()), amount);
    }

    /// Amount checked_sub agrees with the partial order.
    #[test]
    fn amount_checked_sub_ordering(a in 0u128..u128::MAX, b in 0u128..u128::MAX) {
        let (a, b) = (Amount::new(a), Amount::new(b));
        prop_assert_eq!(a.checked_sub(b).is_some(), a >= b);
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// Timestamp elapsed_since: elapsed_since(now) = now - self (saturating).
    #[test]
    fn timestamp_elapsed_since(base in 0u64..1_000_000, offset in 0u64..1_000_000) {
        let t = Timestamp::new(base);
        let now = Timestamp::new(base + offset);
        prop_assert_eq!(t.elapsed_since(now), offset);
    }
}

#[test]
fn epoch_ordering_and_succession() {
    assert!(Epoch::Epoch0 < Epoch::Epoch1);
    assert_eq!(Epoch::Epoch0.next(), Some(Epoch::Epoch1));
    assert_eq!(Epoch::Epoch1.next(), None);
    assert_eq!(Epoch::default(), Epoch::Epoch0);
}
