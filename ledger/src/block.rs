//! The five block kinds of the lattice and their canonical encoding.
//!
//! A block's hash covers its kind-specific fields in wire order; signature
//! and work are excluded so both can be attached after hashing. Work is
//! computed over the block's *root*: the previous hash, or the account for
//! blocks that open a chain.

use velo_crypto::{blake2b_256_multi, sign_message};
use velo_types::{Account, Amount, BlockHash, KeyPair, Signature};

use crate::error::LedgerError;

const TAG_SEND: u8 = 1;
const TAG_RECEIVE: u8 = 2;
const TAG_OPEN: u8 = 3;
const TAG_CHANGE: u8 = 4;
const TAG_STATE: u8 = 6;

/// Domain separator hashed ahead of state block fields, so a state block can
/// never collide with a legacy block over the same bytes.
const STATE_PREAMBLE: [u8; 32] = {
    let mut preamble = [0u8; 32];
    preamble[31] = TAG_STATE;
    preamble
};

/// Sends funds: the sender's balance drops to `balance`, the difference
/// becomes a pending claim for `destination`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendBlock {
    pub previous: BlockHash,
    pub destination: Account,
    pub balance: Amount,
    pub signature: Signature,
    pub work: u64,
}

/// Pockets a pending claim named by `source` onto an already-open chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiveBlock {
    pub previous: BlockHash,
    pub source: BlockHash,
    pub signature: Signature,
    pub work: u64,
}

/// First block of an account chain; pockets the claim named by `source`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenBlock {
    pub source: BlockHash,
    pub representative: Account,
    pub account: Account,
    pub signature: Signature,
    pub work: u64,
}

/// Redelegates the account's balance to a new representative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeBlock {
    pub previous: BlockHash,
    pub representative: Account,
    pub signature: Signature,
    pub work: u64,
}

/// The universal block: encodes send, receive, open, representative change,
/// and epoch upgrade by inspection of `link`, `previous`, and the balance
/// delta.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateBlock {
    pub account: Account,
    pub previous: BlockHash,
    pub representative: Account,
    pub balance: Amount,
    pub link: BlockHash,
    pub signature: Signature,
    pub work: u64,
}

impl SendBlock {
    pub fn new(
        previous: BlockHash,
        destination: Account,
        balance: Amount,
        key: &KeyPair,
        work: u64,
    ) -> Self {
        let mut block = Self {
            previous,
            destination,
            balance,
            signature: Signature::ZERO,
            work,
        };
        block.signature = sign_message(block.hash().as_bytes(), &key.private);
        block
    }

    pub fn hash(&self) -> BlockHash {
        BlockHash::new(blake2b_256_multi(&[
            self.previous.as_bytes(),
            self.destination.as_bytes(),
            &self.balance.to_be_bytes(),
        ]))
    }
}

impl ReceiveBlock {
    pub fn new(previous: BlockHash, source: BlockHash, key: &KeyPair, work: u64) -> Self {
        let mut block = Self {
            previous,
            source,
            signature: Signature::ZERO,
            work,
        };
        block.signature = sign_message(block.hash().as_bytes(), &key.private);
        block
    }

    pub fn hash(&self) -> BlockHash {
        BlockHash::new(blake2b_256_multi(&[
            self.previous.as_bytes(),
            self.source.as_bytes(),
        ]))
    }
}

impl OpenBlock {
    pub fn new(source: BlockHash, representative: Account, key: &KeyPair, work: u64) -> Self {
        let mut block = Self {
            source,
            representative,
            account: key.account(),
            signature: Signature::ZERO,
            work,
        };
        block.signature = sign_message(block.hash().as_bytes(), &key.private);
        block
    }

    pub fn hash(&self) -> BlockHash {
        BlockHash::new(blake2b_256_multi(&[
            self.source.as_bytes(),
            self.representative.as_bytes(),
            self.account.as_bytes(),
        ]))
    }
}

impl ChangeBlock {
    pub fn new(previous: BlockHash, representative: Account, key: &KeyPair, work: u64) -> Self {
        let mut block = Self {
            previous,
            representative,
            signature: Signature::ZERO,
            work,
        };
        block.signature = sign_message(block.hash().as_bytes(), &key.private);
        block
    }

    pub fn hash(&self) -> BlockHash {
        BlockHash::new(blake2b_256_multi(&[
            self.previous.as_bytes(),
            self.representative.as_bytes(),
        ]))
    }
}

impl StateBlock {
    /// `account` is passed explicitly because epoch blocks are signed by the
    /// epoch key on behalf of another account.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account: Account,
        previous: BlockHash,
        representative: Account,
        balance: Amount,
        link: BlockHash,
        key: &KeyPair,
        work: u64,
    ) -> Self {
        let mut block = Self {
            account,
            previous,
            representative,
            balance,
            link,
            signature: Signature::ZERO,
            work,
        };
        block.signature = sign_message(block.hash().as_bytes(), &key.private);
        block
    }

    pub fn hash(&self) -> BlockHash {
        BlockHash::new(blake2b_256_multi(&[
            &STATE_PREAMBLE,
            self.account.as_bytes(),
            self.previous.as_bytes(),
            self.representative.as_bytes(),
            &self.balance.to_be_bytes(),
            self.link.as_bytes(),
        ]))
    }
}

/// A block of any kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Send(SendBlock),
    Receive(ReceiveBlock),
    Open(OpenBlock),
    Change(ChangeBlock),
    State(StateBlock),
}

impl Block {
    /// Canonical hash over the kind-specific fields.
    pub fn hash(&self) -> BlockHash {
        match self {
            Block::Send(b) => b.hash(),
            Block::Receive(b) => b.hash(),
            Block::Open(b) => b.hash(),
            Block::Change(b) => b.hash(),
            Block::State(b) => b.hash(),
        }
    }

    /// The hash of the preceding block on the same chain; zero for blocks
    /// that open a chain.
    pub fn previous(&self) -> BlockHash {
        match self {
            Block::Send(b) => b.previous,
            Block::Receive(b) => b.previous,
            Block::Open(_) => BlockHash::ZERO,
            Block::Change(b) => b.previous,
            Block::State(b) => b.previous,
        }
    }

    /// The election root: competing forks share it. For blocks that open a
    /// chain this is the account identifier; otherwise the previous hash.
    pub fn root(&self) -> BlockHash {
        match self {
            Block::Open(b) => b.account.as_hash(),
            Block::State(b) if b.previous.is_zero() => b.account.as_hash(),
            _ => self.previous(),
        }
    }

    pub fn work(&self) -> u64 {
        match self {
            Block::Send(b) => b.work,
            Block::Receive(b) => b.work,
            Block::Open(b) => b.work,
            Block::Change(b) => b.work,
            Block::State(b) => b.work,
        }
    }

    pub fn signature(&self) -> &Signature {
        match self {
            Block::Send(b) => &b.signature,
            Block::Receive(b) => &b.signature,
            Block::Open(b) => &b.signature,
            Block::Change(b) => &b.signature,
            Block::State(b) => &b.signature,
        }
    }

    /// Serialize to the canonical big-endian wire format, kind tag first.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(224);
        match self {
            Block::Send(b) => {
                bytes.push(TAG_SEND);
                bytes.extend_from_slice(b.previous.as_bytes());
                bytes.extend_from_slice(b.destination.as_bytes());
                bytes.extend_from_slice(&b.balance.to_be_bytes());
                bytes.extend_from_slice(b.signature.as_bytes());
                bytes.extend_from_slice(&b.work.to_be_bytes());
            }
            Block::Receive(b) => {
                bytes.push(TAG_RECEIVE);
                bytes.extend_from_slice(b.previous.as_bytes());
                bytes.extend_from_slice(b.source.as_bytes());
                bytes.extend_from_slice(b.signature.as_bytes());
                bytes.extend_from_slice(&b.work.to_be_bytes());
            }
            Block::Open(b) => {
                bytes.push(TAG_OPEN);
                bytes.extend_from_slice(b.source.as_bytes());
                bytes.extend_from_slice(b.representative.as_bytes());
                bytes.extend_from_slice(b.account.as_bytes());
                bytes.extend_from_slice(b.signature.as_bytes());
                bytes.extend_from_slice(&b.work.to_be_bytes());
            }
            Block::Change(b) => {
                bytes.push(TAG_CHANGE);
                bytes.extend_from_slice(b.previous.as_bytes());
                bytes.extend_from_slice(b.representative.as_bytes());
                bytes.extend_from_slice(b.signature.as_bytes());
                bytes.extend_from_slice(&b.work.to_be_bytes());
            }
            Block::State(b) => {
                bytes.push(TAG_STATE);
                bytes.extend_from_slice(b.account.as_bytes());
                bytes.extend_from_slice(b.previous.as_bytes());
                bytes.extend_from_slice(b.representative.as_bytes());
                bytes.extend_from_slice(&b.balance.to_be_bytes());
                bytes.extend_from_slice(b.link.as_bytes());
                bytes.extend_from_slice(b.signature.as_bytes());
                bytes.extend_from_slice(&b.work.to_be_bytes());
            }
        }
        bytes
    }

    /// Parse the canonical wire format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Block, LedgerError> {
        let (&tag, rest) = bytes
            .split_first()
            .ok_or_else(|| LedgerError::MalformedBlock("empty buffer".into()))?;
        let mut reader = Reader::new(rest);
        let block = match tag {
            TAG_SEND => Block::Send(SendBlock {
                previous: reader.hash()?,
                destination: reader.account()?,
                balance: reader.amount()?,
                signature: reader.signature()?,
                work: reader.work()?,
            }),
            TAG_RECEIVE => Block::Receive(ReceiveBlock {
                previous: reader.hash()?,
                source: reader.hash()?,
                signature: reader.signature()?,
                work: reader.work()?,
            }),
            TAG_OPEN => Block::Open(OpenBlock {
                source: reader.hash()?,
                representative: reader.account()?,
                account: reader.account()?,
                signature: reader.signature()?,
                work: reader.work()?,
            }),
            TAG_CHANGE => Block::Change(ChangeBlock {
                previous: reader.hash()?,
                representative: reader.account()?,
                signature: reader.signature()?,
                work: reader.work()?,
            }),
            TAG_STATE => Block::State(StateBlock {
                account: reader.account()?,
                previous: reader.hash()?,
                representative: reader.account()?,
                balance: reader.amount()?,
                link: reader.hash()?,
                signature: reader.signature()?,
                work: reader.work()?,
            }),
            other => {
                return Err(LedgerError::MalformedBlock(format!(
                    "unknown block tag {other}"
                )))
            }
        };
        reader.finish()?;
        Ok(block)
    }
}

/// Sequential field reader over a wire buffer.
struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], LedgerError> {
        if self.bytes.len() < len {
            return Err(LedgerError::MalformedBlock("truncated block".into()));
        }
        let (taken, rest) = self.bytes.split_at(len);
        self.bytes = rest;
        Ok(taken)
    }

    fn hash(&mut self) -> Result<BlockHash, LedgerError> {
        let mut raw = [0u8; 32];
        raw.copy_from_slice(self.take(32)?);
        Ok(BlockHash::new(raw))
    }

    fn account(&mut self) -> Result<Account, LedgerError> {
        let mut raw = [0u8; 32];
        raw.copy_from_slice(self.take(32)?);
        Ok(Account::new(raw))
    }

    fn amount(&mut self) -> Result<Amount, LedgerError> {
        let mut raw = [0u8; 16];
        raw.copy_from_slice(self.take(16)?);
        Ok(Amount::from_be_bytes(raw))
    }

    fn signature(&mut self) -> Result<Signature, LedgerError> {
        let mut raw = [0u8; 64];
        raw.copy_from_slice(self.take(64)?);
        Ok(Signature(raw))
    }

    fn work(&mut self) -> Result<u64, LedgerError> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.take(8)?);
        Ok(u64::from_be_bytes(raw))
    }

    fn finish(&self) -> Result<(), LedgerError> {
        if self.bytes.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::MalformedBlock("trailing bytes".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use velo_crypto::{keypair_from_seed, verify_signature};
    use velo_types::PublicKey;

    fn key() -> KeyPair {
        keypair_from_seed(&[11u8; 32])
    }

    fn sample_state(key: &KeyPair) -> StateBlock {
        StateBlock::new(
            key.account(),
            BlockHash::new([5u8; 32]),
            Account::new([6u8; 32]),
            Amount::new(1234),
            BlockHash::new([7u8; 32]),
            key,
            42,
        )
    }

    #[test]
    fn hash_is_deterministic() {
        let key = key();
        let b1 = sample_state(&key);
        assert_eq!(b1.hash(), b1.hash());
    }

    #[test]
    fn hash_excludes_signature_and_work() {
        let key = key();
        let mut b = sample_state(&key);
        let before = b.hash();
        b.signature = Signature([0xFF; 64]);
        b.work = 999_999;
        assert_eq!(b.hash(), before);
    }

    #[test]
    fn hash_covers_every_field() {
        let key = key();
        let base = sample_state(&key);
        let mut changed = base.clone();
        changed.balance = Amount::new(4321);
        assert_ne!(base.hash(), changed.hash());
        let mut changed = base.clone();
        changed.link = BlockHash::new([8u8; 32]);
        assert_ne!(base.hash(), changed.hash());
    }

    #[test]
    fn state_and_legacy_hashes_are_domain_separated() {
        // A receive and a state block sharing leading fields must not collide.
        let key = key();
        let receive = ReceiveBlock::new(BlockHash::new([1u8; 32]), BlockHash::new([2u8; 32]), &key, 0);
        let state = sample_state(&key);
        assert_ne!(receive.hash(), state.hash());
    }

    #[test]
    fn constructors_sign_the_hash() {
        let key = key();
        let block = Block::Send(SendBlock::new(
            BlockHash::new([9u8; 32]),
            Account::new([3u8; 32]),
            Amount::new(50),
            &key,
            7,
        ));
        assert!(verify_signature(
            block.hash().as_bytes(),
            block.signature(),
            &PublicKey(*key.account().as_bytes()),
        ));
    }

    #[test]
    fn root_of_open_is_account() {
        let key = key();
        let open = OpenBlock::new(BlockHash::new([1u8; 32]), key.account(), &key, 0);
        let block = Block::Open(open);
        assert_eq!(block.root(), key.account().as_hash());
        assert!(block.previous().is_zero());
    }

    #[test]
    fn root_of_state_open_is_account() {
        let key = key();
        let state = StateBlock::new(
            key.account(),
            BlockHash::ZERO,
            key.account(),
            Amount::new(1),
            BlockHash::new([2u8; 32]),
            &key,
            0,
        );
        assert_eq!(Block::State(state).root(), key.account().as_hash());
    }

    #[test]
    fn root_of_chained_block_is_previous() {
        let key = key();
        let send = SendBlock::new(
            BlockHash::new([9u8; 32]),
            Account::new([3u8; 32]),
            Amount::new(50),
            &key,
            0,
        );
        let block = Block::Send(send);
        assert_eq!(block.root(), BlockHash::new([9u8; 32]));
    }

    #[test]
    fn wire_roundtrip_every_kind() {
        let key = key();
        let blocks = vec![
            Block::Send(SendBlock::new(
                BlockHash::new([1u8; 32]),
                Account::new([2u8; 32]),
                Amount::new(77),
                &key,
                1,
            )),
            Block::Receive(ReceiveBlock::new(
                BlockHash::new([3u8; 32]),
                BlockHash::new([4u8; 32]),
                &key,
                2,
            )),
            Block::Open(OpenBlock::new(BlockHash::new([5u8; 32]), key.account(), &key, 3)),
            Block::Change(ChangeBlock::new(BlockHash::new([6u8; 32]), key.account(), &key, 4)),
            Block::State(sample_state(&key)),
        ];
        for block in blocks {
            let decoded = Block::from_bytes(&block.to_bytes()).unwrap();
            assert_eq!(decoded, block);
            assert_eq!(decoded.hash(), block.hash());
        }
    }

    #[test]
    fn wire_lengths_are_fixed() {
        let key = key();
        let send = Block::Send(SendBlock::new(
            BlockHash::ZERO,
            Account::ZERO,
            Amount::ZERO,
            &key,
            0,
        ));
        assert_eq!(send.to_bytes().len(), 1 + 32 + 32 + 16 + 64 + 8);
        let state = Block::State(sample_state(&key));
        assert_eq!(state.to_bytes().len(), 1 + 32 + 32 + 32 + 16 + 32 + 64 + 8);
    }

    #[test]
    fn truncated_and_unknown_tags_rejected() {
        let key = key();
        let bytes = Block::State(sample_state(&key)).to_bytes();
        assert!(Block::from_bytes(&bytes[..bytes.len() - 1]).is_err());
        assert!(Block::from_bytes(&[9u8, 0, 0]).is_err());
        assert!(Block::from_bytes(&[]).is_err());
    }
}
