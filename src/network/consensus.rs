//! Longest-valid-chain conflict resolution.

use futures::future::join_all;
use log::{debug, info, warn};

use super::{ChainDump, PeerTransport};
use crate::blockchain::validator::{self, VerifiedChain};

/// Outcome of one resolution round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Adopted { peer: String, length: usize },
    Unchanged,
}

/// Ask every peer for its chain concurrently. Peers that fail or time
/// out simply drop out of the result; order follows `peers`.
pub async fn fetch_all(transport: &dyn PeerTransport, peers: &[String]) -> Vec<(String, ChainDump)> {
    let fetches = peers.iter().map(|peer| async move {
        match transport.fetch_chain(peer).await {
            Ok(dump) => Some((peer.clone(), dump)),
            Err(e) => {
                warn!("CONSENSUS - skipping peer {}: {}", peer, e);
                None
            }
        }
    });
    join_all(fetches).await.into_iter().flatten().collect()
}

/// Pick the longest chain that is longer than `local_len` and passes full
/// validation. On equal lengths the peer seen first wins.
pub fn select_longest(
    local_len: usize,
    reports: Vec<(String, ChainDump)>,
    difficulty: u32,
) -> Option<(String, VerifiedChain)> {
    let mut best_len = local_len;
    let mut best = None;

    for (peer, dump) in reports {
        if dump.length != dump.chain.len() {
            warn!(
                "CONSENSUS - peer {} reported length {} but sent {} blocks",
                peer,
                dump.length,
                dump.chain.len()
            );
            continue;
        }
        if dump.length <= best_len {
            debug!(
                "CONSENSUS - peer {} chain ({}) not longer than {}",
                peer, dump.length, best_len
            );
            continue;
        }
        match validator::verified(dump.chain, difficulty) {
            Ok(chain) => {
                best_len = chain.len();
                best = Some((peer, chain));
            }
            Err(e) => warn!("CONSENSUS - peer {} chain rejected: {}", peer, e),
        }
    }

    if let Some((peer, chain)) = &best {
        info!("CONSENSUS - peer {} offers longest valid chain ({})", peer, chain.len());
    }
    best
}
