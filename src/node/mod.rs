//! The node service: one chain + pending pool behind a single lock, the
//! peer set, and the orchestration of mining, admission and consensus.

use actix_web::web;
use futures::future::join_all;
use futures::lock::Mutex as AsyncMutex;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::blockchain::{Block, BlockRejection, Blockchain, Transaction, pow};
use crate::error::{NodeError, Result};
use crate::network::consensus::{fetch_all, select_longest};
use crate::network::{ChainDump, PeerSet, PeerTransport, Resolution};

/// Result of a successful call to [`Node::mine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MineOutcome {
    NothingToMine,
    Mined {
        index: u64,
        hash: String,
        nonce: u64,
        /// False when consensus swapped in a longer peer chain right after.
        announced: bool,
    },
}

pub struct Node {
    blockchain: Mutex<Blockchain>,
    peers: Mutex<PeerSet>,
    /// Held from snapshot to commit; mining is not reentrant.
    mining: AsyncMutex<()>,
    /// Cancels the in-flight proof-of-work search when the tip moves.
    mining_cancel: Mutex<Option<CancellationToken>>,
    transport: Arc<dyn PeerTransport>,
    address: String,
    difficulty: u32,
}

impl Node {
    pub fn new(address: &str, difficulty: u32, transport: Arc<dyn PeerTransport>) -> Self {
        let address = address.trim_end_matches('/').to_string();
        info!("NODE - {} starting (difficulty {})", address, difficulty);
        Self {
            blockchain: Mutex::new(Blockchain::new(difficulty)),
            peers: Mutex::new(PeerSet::new(&address)),
            mining: AsyncMutex::new(()),
            mining_cancel: Mutex::new(None),
            transport,
            address,
            difficulty,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /* -------------------- Queries -------------------- */

    pub fn chain_dump(&self) -> ChainDump {
        let chain = {
            let bc = self.blockchain.lock().expect("mutex poisoned");
            bc.chain().to_vec()
        };
        ChainDump {
            length: chain.len(),
            chain,
            peers: self.peer_addresses(),
        }
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        let bc = self.blockchain.lock().expect("mutex poisoned");
        bc.pending().to_vec()
    }

    /// `(valid, length)` of the local chain.
    pub fn validate(&self) -> (bool, usize) {
        let bc = self.blockchain.lock().expect("mutex poisoned");
        (bc.is_valid_chain(), bc.len())
    }

    pub fn len(&self) -> usize {
        let bc = self.blockchain.lock().expect("mutex poisoned");
        bc.len()
    }

    pub fn peer_addresses(&self) -> Vec<String> {
        let peers = self.peers.lock().expect("mutex poisoned");
        peers.addresses()
    }

    /* -------------------- Mutations -------------------- */

    pub fn submit_transaction(&self, fields: Map<String, Value>) -> Result<Transaction> {
        let tx = Transaction::from_fields(fields)?;
        let mut bc = self.blockchain.lock().expect("mutex poisoned");
        bc.submit_transaction(tx.clone());
        debug!("NODE - accepted transaction from {}", tx.author);
        Ok(tx)
    }

    pub fn add_peer(&self, address: &str) -> Result<bool> {
        let mut peers = self.peers.lock().expect("mutex poisoned");
        let added = peers.insert(address)?;
        if added {
            info!("NODE - registered peer {} ({} known)", address, peers.len());
        }
        Ok(added)
    }

    /// A peer announces `address`; hand back our chain so it can sync.
    pub fn register_node(&self, address: &str) -> Result<ChainDump> {
        self.add_peer(address)?;
        Ok(self.chain_dump())
    }

    /// Admit a block received from a peer. The block must carry the hash
    /// it was sealed with.
    pub fn receive_block(&self, block: Block) -> Result<u64> {
        let index = block.index;
        let hash = block.hash.clone().ok_or(BlockRejection::MissingHash)?;

        let mut bc = self.blockchain.lock().expect("mutex poisoned");
        bc.append(block, hash)?;
        self.cancel_mining();
        info!("NODE - appended block #{} from a peer", index);
        Ok(index)
    }

    /// Mine the pending pool. The proof-of-work search runs on a blocking
    /// thread without the chain lock; the result is re-checked against the
    /// tip when it comes back.
    pub async fn mine(&self) -> Result<MineOutcome> {
        let Some(guard) = self.mining.try_lock() else {
            return Err(NodeError::MiningInProgress);
        };

        let (candidate, token) = {
            let bc = self.blockchain.lock().expect("mutex poisoned");
            let Some(candidate) = bc.next_candidate() else {
                debug!("MINER - nothing to mine");
                return Ok(MineOutcome::NothingToMine);
            };
            let token = CancellationToken::new();
            *self.mining_cancel.lock().expect("mutex poisoned") = Some(token.clone());
            (candidate, token)
        };
        debug!(
            "MINER - searching for block #{} ({} txs)",
            candidate.index,
            candidate.transactions.len()
        );

        let difficulty = self.difficulty;
        let searched = web::block(move || {
            let mut candidate = candidate;
            let hash = pow::seal_cancellable(&mut candidate, difficulty, &token);
            (candidate, hash)
        })
        .await;
        self.mining_cancel.lock().expect("mutex poisoned").take();

        let (candidate, hash) = searched.map_err(|e| NodeError::Miner(e.to_string()))?;
        let Some(hash) = hash else {
            warn!("MINER - search abandoned, tip moved while mining");
            return Err(NodeError::MiningAbandoned);
        };

        let (index, nonce) = (candidate.index, candidate.nonce);
        self.commit_search(candidate, hash.clone())?;
        // Consensus and announcing are network bound; let the next attempt start.
        drop(guard);

        let announced = match self.resolve_conflicts().await {
            Resolution::Unchanged => {
                let block = {
                    let bc = self.blockchain.lock().expect("mutex poisoned");
                    bc.chain().get(index as usize).cloned()
                };
                if let Some(block) = block {
                    self.announce_block(&block).await;
                }
                true
            }
            Resolution::Adopted { .. } => false,
        };

        Ok(MineOutcome::Mined {
            index,
            hash,
            nonce,
            announced,
        })
    }

    /// Put a finished search on the chain. A tip that moved after the
    /// search ended makes this a conflict, not a bad block.
    fn commit_search(&self, candidate: Block, hash: String) -> Result<u64> {
        let mut bc = self.blockchain.lock().expect("mutex poisoned");
        bc.commit_mined(candidate, hash).map_err(|reason| {
            warn!("MINER - mined block went stale: {}", reason);
            NodeError::MiningRejected(reason)
        })
    }

    /// Longest-valid-chain rule against every known peer.
    pub async fn resolve_conflicts(&self) -> Resolution {
        let local_len = self.len();
        let peers = self.peer_addresses();
        if peers.is_empty() {
            return Resolution::Unchanged;
        }

        let reports = fetch_all(self.transport.as_ref(), &peers).await;
        let Some((peer, chain)) = select_longest(local_len, reports, self.difficulty) else {
            return Resolution::Unchanged;
        };

        let mut bc = self.blockchain.lock().expect("mutex poisoned");
        // The chain may have grown while peers were being queried.
        if chain.len() <= bc.len() {
            debug!(
                "CONSENSUS - candidate from {} no longer longer than local chain",
                peer
            );
            return Resolution::Unchanged;
        }
        let length = chain.len();
        bc.replace_chain(chain);
        self.cancel_mining();
        Resolution::Adopted { peer, length }
    }

    /// Join the network through `remote`: register with it, rebuild our
    /// chain from its dump and learn its peers. Our pending pool survives.
    pub async fn register_with(&self, remote: &str) -> Result<usize> {
        let remote = crate::network::peers::normalize_address(remote)?;
        let dump = self.transport.register_with(&remote, &self.address).await?;

        let mut rebuilt = Blockchain::from_blocks(dump.chain, self.difficulty)?;
        let length = rebuilt.len();
        {
            let mut bc = self.blockchain.lock().expect("mutex poisoned");
            rebuilt.inherit_pending(&mut bc);
            *bc = rebuilt;
            self.cancel_mining();
        }

        self.add_peer(&remote)?;
        for peer in dump.peers {
            if let Err(e) = self.add_peer(&peer) {
                warn!("NODE - ignoring peer from {}: {}", remote, e);
            }
        }
        info!("NODE - registered with {} (chain length {})", remote, length);
        Ok(length)
    }

    /// Offer `block` to every peer. Failures are logged and dropped.
    pub async fn announce_block(&self, block: &Block) {
        let peers = self.peer_addresses();
        let sends = peers.iter().map(|peer| async move {
            if let Err(e) = self.transport.announce_block(peer, block).await {
                warn!("ANNOUNCE - peer {}: {}", peer, e);
            }
        });
        join_all(sends).await;
        debug!("ANNOUNCE - block #{} offered to {} peers", block.index, peers.len());
    }

    fn cancel_mining(&self) {
        if let Some(token) = self.mining_cancel.lock().expect("mutex poisoned").as_ref() {
            token.cancel();
        }
    }
}
