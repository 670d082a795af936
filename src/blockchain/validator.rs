//! Block and chain validation.
//!
//! Every check here is pure: the digest is recomputed from the block's
//! explicit fields, so the stored `hash` never has to be stripped and the
//! input is never mutated.

use super::{Block, GENESIS_PREVIOUS_HASH};

/// Why a single block was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockRejection {
    #[error("invalid block index: expected {expected}, got {actual}")]
    IndexMismatch { expected: u64, actual: u64 },

    #[error("previous hash mismatch: expected {expected}, got {actual}")]
    LinkageMismatch { expected: String, actual: String },

    #[error("hash does not meet difficulty {difficulty}")]
    InsufficientWork { difficulty: u32 },

    #[error("claimed hash {claimed} does not match computed {computed}")]
    HashMismatch { claimed: String, computed: String },

    #[error("block is not sealed")]
    MissingHash,
}

/// Why a whole chain was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainRejection {
    #[error("chain is empty")]
    Empty,

    #[error("genesis block does not match the local genesis")]
    GenesisMismatch,

    #[error("block at position {position} rejected: {reason}")]
    InvalidBlock {
        position: usize,
        reason: BlockRejection,
    },
}

/// A chain that passed [`verify_chain`]. Only this module can build one,
/// so holding it is proof the blocks were checked.
#[derive(Debug, Clone)]
pub struct VerifiedChain(Vec<Block>);

impl VerifiedChain {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.0
    }
}

/// True when `hash` starts with `difficulty` zero hex characters.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|c| c == b'0')
}

/// `claimed_hash` must satisfy the difficulty and be the block's digest.
pub fn verify_proof(block: &Block, claimed_hash: &str, difficulty: u32) -> Result<(), BlockRejection> {
    if !meets_difficulty(claimed_hash, difficulty) {
        return Err(BlockRejection::InsufficientWork { difficulty });
    }
    let computed = block.compute_hash();
    if computed != claimed_hash {
        return Err(BlockRejection::HashMismatch {
            claimed: claimed_hash.to_string(),
            computed,
        });
    }
    Ok(())
}

#[cfg(test)]
pub fn is_valid_proof(block: &Block, claimed_hash: &str, difficulty: u32) -> bool {
    verify_proof(block, claimed_hash, difficulty).is_ok()
}

/// Admission check for a block that should follow a tip with
/// `expected_index - 1` and hash `expected_previous_hash`.
pub fn verify_linkage_and_proof(
    block: &Block,
    claimed_hash: &str,
    expected_index: u64,
    expected_previous_hash: &str,
    difficulty: u32,
) -> Result<(), BlockRejection> {
    if block.index != expected_index {
        return Err(BlockRejection::IndexMismatch {
            expected: expected_index,
            actual: block.index,
        });
    }
    if block.previous_hash != expected_previous_hash {
        return Err(BlockRejection::LinkageMismatch {
            expected: expected_previous_hash.to_string(),
            actual: block.previous_hash.clone(),
        });
    }
    verify_proof(block, claimed_hash, difficulty)
}

/// Walk `blocks` from genesis forward and stop at the first failure.
pub fn verify_chain(blocks: &[Block], difficulty: u32) -> Result<(), ChainRejection> {
    if blocks.is_empty() {
        return Err(ChainRejection::Empty);
    }

    let mut previous_hash = GENESIS_PREVIOUS_HASH;
    for (position, block) in blocks.iter().enumerate() {
        let invalid = |reason| ChainRejection::InvalidBlock { position, reason };
        let hash = block.sealed_hash().ok_or_else(|| invalid(BlockRejection::MissingHash))?;
        verify_linkage_and_proof(block, hash, position as u64, previous_hash, difficulty)
            .map_err(invalid)?;
        previous_hash = hash;
    }
    Ok(())
}

pub fn is_valid_chain(blocks: &[Block], difficulty: u32) -> bool {
    verify_chain(blocks, difficulty).is_ok()
}

/// Validate `blocks` and wrap them for a wholesale chain swap.
pub fn verified(blocks: Vec<Block>, difficulty: u32) -> Result<VerifiedChain, ChainRejection> {
    verify_chain(&blocks, difficulty)?;
    Ok(VerifiedChain(blocks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{Blockchain, Transaction, pow};

    fn mined_chain(blocks: usize) -> Vec<Block> {
        let mut bc = Blockchain::new(2);
        for i in 0..blocks {
            bc.submit_transaction(Transaction::new("alice", format!("msg {i}")));
            bc.mine().unwrap();
        }
        bc.chain().to_vec()
    }

    fn sealed_child(parent: &Block) -> (Block, String) {
        let mut b = Block::new(
            parent.index + 1,
            parent.hash.clone().unwrap(),
            vec![Transaction::new("carol", "hey")],
        );
        let hash = pow::seal(&mut b, 2);
        (b, hash)
    }

    #[test]
    fn difficulty_predicate() {
        assert!(meets_difficulty("00ab", 2));
        assert!(meets_difficulty("abcd", 0));
        assert!(!meets_difficulty("0a0b", 2));
        assert!(!meets_difficulty("0", 2));
        for d in 1..6 {
            assert!(!meets_difficulty(&format!("{}1{}", "0".repeat(d - 1), "f".repeat(63)), d as u32));
        }
    }

    #[test]
    fn proof_rejects_hash_without_leading_zeros() {
        let g = Block::genesis(2);
        let (child, _) = sealed_child(&g);
        let wrong = format!("f{}", &child.compute_hash()[1..]);
        assert_eq!(
            verify_proof(&child, &wrong, 2),
            Err(BlockRejection::InsufficientWork { difficulty: 2 })
        );
    }

    #[test]
    fn proof_rejects_hash_of_other_content() {
        let g = Block::genesis(2);
        let (mut child, hash) = sealed_child(&g);
        assert!(is_valid_proof(&child, &hash, 2));
        child.transactions[0].content = "tampered".into();
        assert!(matches!(
            verify_proof(&child, &hash, 2),
            Err(BlockRejection::HashMismatch { .. })
        ));
    }

    #[test]
    fn linkage_failure_is_reported_distinctly() {
        let g = Block::genesis(2);
        let (mut child, _) = sealed_child(&g);
        child.previous_hash = "deadbeef".into();
        let hash = pow::seal(&mut child, 2);
        assert!(is_valid_proof(&child, &hash, 2));
        assert!(matches!(
            verify_linkage_and_proof(&child, &hash, 1, g.sealed_hash().unwrap(), 2),
            Err(BlockRejection::LinkageMismatch { .. })
        ));
    }

    #[test]
    fn index_gap_is_rejected() {
        let g = Block::genesis(2);
        let mut skip = Block::new(5, g.hash.clone().unwrap(), vec![]);
        let hash = pow::seal(&mut skip, 2);
        assert_eq!(
            verify_linkage_and_proof(&skip, &hash, 1, g.sealed_hash().unwrap(), 2),
            Err(BlockRejection::IndexMismatch { expected: 1, actual: 5 })
        );
    }

    #[test]
    fn freshly_mined_chain_is_valid() {
        for n in [0, 1, 4] {
            let chain = mined_chain(n);
            assert_eq!(chain.len(), n + 1);
            assert!(is_valid_chain(&chain, 2));
        }
    }

    #[test]
    fn verify_chain_does_not_touch_input() {
        let chain = mined_chain(2);
        let before = chain.clone();
        verify_chain(&chain, 2).unwrap();
        verify_chain(&chain, 2).unwrap();
        assert_eq!(chain, before);
    }

    #[test]
    fn corrupt_block_rejects_whole_chain() {
        let mut chain = mined_chain(3);
        chain[2].transactions[0].author = "mallory".into();
        assert!(matches!(
            verify_chain(&chain, 2),
            Err(ChainRejection::InvalidBlock { position: 2, reason: BlockRejection::HashMismatch { .. } })
        ));
    }

    #[test]
    fn unsealed_or_empty_chain_is_rejected() {
        assert_eq!(verify_chain(&[], 2), Err(ChainRejection::Empty));

        let mut chain = mined_chain(1);
        chain[1].hash = None;
        assert_eq!(
            verify_chain(&chain, 2),
            Err(ChainRejection::InvalidBlock { position: 1, reason: BlockRejection::MissingHash })
        );
    }

    #[test]
    fn chain_must_start_from_sentinel() {
        let chain = mined_chain(2);
        assert!(matches!(
            verify_chain(&chain[1..], 2),
            Err(ChainRejection::InvalidBlock { position: 0, .. })
        ));
    }
}
