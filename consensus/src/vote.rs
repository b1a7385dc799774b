//! A representative's signed vote for a block.

use velo_crypto::{blake2b_256_multi, sign_message, verify_signature};
use velo_ledger::Block;
use velo_types::{Account, KeyPair, PublicKey, Signature};

/// A vote names one candidate block and carries a per-voter sequence number;
/// a voter's later votes supersede earlier ones.
#[derive(Clone, Debug)]
pub struct Vote {
    pub voter: Account,
    pub sequence: u64,
    pub block: Block,
    pub signature: Signature,
}

impl Vote {
    pub fn new(key: &KeyPair, sequence: u64, block: Block) -> Self {
        let mut vote = Self {
            voter: key.account(),
            sequence,
            block,
            signature: Signature::ZERO,
        };
        vote.signature = sign_message(&vote.digest(), &key.private);
        vote
    }

    /// Canonical digest the voter signs: block hash then sequence.
    pub fn digest(&self) -> [u8; 32] {
        blake2b_256_multi(&[
            self.block.hash().as_bytes(),
            &self.sequence.to_be_bytes(),
        ])
    }

    /// Verify the signature against the voter's key.
    pub fn validate(&self) -> bool {
        verify_signature(
            &self.digest(),
            &self.signature,
            &PublicKey(*self.voter.as_bytes()),
        )
    }
}
