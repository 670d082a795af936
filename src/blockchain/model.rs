use log::{debug, info, warn};

use super::validator::{self, BlockRejection, ChainRejection, VerifiedChain};
use super::{Block, Transaction};

/// In-memory blockchain with its pending-transaction pool.
///
/// Both live behind the same lock in the node, since mining reads the
/// pool and the tip and then writes both.
#[derive(Debug)]
pub struct Blockchain {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    difficulty: u32,
}

impl Blockchain {
    /// Initialize a new blockchain with a genesis block.
    pub fn new(difficulty: u32) -> Self {
        Self {
            chain: vec![Block::genesis(difficulty)],
            pending: Vec::new(),
            difficulty,
        }
    }

    /// Rebuild a chain from a peer's dump. The dump must start with the
    /// same genesis we derive locally, and every following block goes
    /// through [`Blockchain::append`].
    pub fn from_blocks(blocks: Vec<Block>, difficulty: u32) -> Result<Self, ChainRejection> {
        let mut bc = Self::new(difficulty);
        let mut blocks = blocks.into_iter();

        let genesis = blocks.next().ok_or(ChainRejection::Empty)?;
        if genesis != bc.chain[0] {
            return Err(ChainRejection::GenesisMismatch);
        }

        for (position, block) in blocks.enumerate() {
            let position = position + 1;
            let hash = block.hash.clone().ok_or(ChainRejection::InvalidBlock {
                position,
                reason: BlockRejection::MissingHash,
            })?;
            bc.append(block, hash)
                .map_err(|reason| ChainRejection::InvalidBlock { position, reason })?;
        }
        Ok(bc)
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    /// Hash of the chain tip.
    pub fn tip_hash(&self) -> &str {
        self.last_block().sealed_hash().unwrap_or_default()
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Queue a transaction for the next mined block.
    pub fn submit_transaction(&mut self, tx: Transaction) {
        self.pending.push(tx);
        debug!("pending pool size now {}", self.pending.len());
    }

    /// Snapshot the pending pool into an unsealed block on top of the tip.
    /// `None` when there is nothing to mine.
    pub fn next_candidate(&self) -> Option<Block> {
        if self.pending.is_empty() {
            return None;
        }
        let last = self.last_block();
        Some(Block::new(
            last.index + 1,
            self.tip_hash().to_string(),
            self.pending.clone(),
        ))
    }

    /// The single admission gate: a block is appended only if it extends
    /// the current tip and `claimed_hash` is a valid proof for it.
    pub fn append(&mut self, mut block: Block, claimed_hash: String) -> Result<(), BlockRejection> {
        let last = self.last_block();
        let checked = validator::verify_linkage_and_proof(
            &block,
            &claimed_hash,
            last.index + 1,
            self.tip_hash(),
            self.difficulty,
        );
        if let Err(reason) = checked {
            match &reason {
                BlockRejection::LinkageMismatch { .. } | BlockRejection::IndexMismatch { .. } => {
                    warn!("CHAIN - block #{} discarded (linkage): {}", block.index, reason)
                }
                _ => warn!("CHAIN - block #{} discarded (proof): {}", block.index, reason),
            }
            return Err(reason);
        }

        block.hash = Some(claimed_hash);
        self.chain.push(block);
        debug!("CHAIN - height now {}", self.chain.len());
        Ok(())
    }

    /// Append a block mined from [`Blockchain::next_candidate`] and drop its
    /// batch from the pending pool. On rejection the pool is left untouched.
    pub fn commit_mined(&mut self, block: Block, hash: String) -> Result<u64, BlockRejection> {
        let index = block.index;
        let batch = block.transactions.len();
        self.append(block, hash)?;

        // The batch was a snapshot of the pool's prefix; anything submitted
        // while mining stays queued.
        let batch = batch.min(self.pending.len());
        self.pending.drain(..batch);
        info!(
            "MINER - sealed block #{} ({} txs, {} still pending)",
            index,
            batch,
            self.pending.len()
        );
        Ok(index)
    }

    /// Mine the whole pending pool in one go while holding `&mut self`.
    /// Returns `Ok(None)` when there is nothing to mine.
    #[cfg(test)]
    pub fn mine(&mut self) -> Result<Option<u64>, BlockRejection> {
        let Some(mut candidate) = self.next_candidate() else {
            return Ok(None);
        };
        let hash = super::pow::seal(&mut candidate, self.difficulty);
        self.commit_mined(candidate, hash).map(Some)
    }

    /// Swap in a longer chain wholesale. The pending pool stays as is.
    pub fn replace_chain(&mut self, chain: VerifiedChain) {
        info!(
            "CHAIN - replacing local chain ({} blocks) with {} blocks",
            self.chain.len(),
            chain.len()
        );
        self.chain = chain.into_blocks();
    }

    /// Take over `previous`'s pending pool, used when a rebuilt chain
    /// replaces the one this node was running.
    pub fn inherit_pending(&mut self, previous: &mut Blockchain) {
        self.pending = std::mem::take(&mut previous.pending);
    }

    /// Validate the entire chain: linkage, hashes and PoW.
    pub fn is_valid_chain(&self) -> bool {
        validator::is_valid_chain(&self.chain, self.difficulty)
    }
}
