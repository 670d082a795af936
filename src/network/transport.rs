//! Peer-to-peer calls a node makes: fetching chains, announcing blocks
//! and registering with another node.

use async_trait::async_trait;
use std::time::Duration;

use super::{API_PREFIX, ChainDump, RegisterRequest};
use crate::blockchain::Block;

/// Errors that can occur while talking to a peer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("peer {0} timed out")]
    Timeout(String),

    #[error("peer {peer} answered with status {status}")]
    Status { peer: String, status: u16 },

    #[error("request to {peer} failed: {reason}")]
    Request { peer: String, reason: String },
}

/// How a node reaches its peers. Implementations must bound every call
/// so one dead peer cannot stall mining or consensus.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Ask `peer` for its full chain.
    async fn fetch_chain(&self, peer: &str) -> Result<ChainDump, TransportError>;

    /// Offer a freshly mined block to `peer`.
    async fn announce_block(&self, peer: &str, block: &Block) -> Result<(), TransportError>;

    /// Register `own_address` with `peer`, receiving its chain and peer list.
    async fn register_with(&self, peer: &str, own_address: &str)
    -> Result<ChainDump, TransportError>;
}

/// JSON-over-HTTP transport talking to other nodes' `/api/v1` routes.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request {
                peer: String::from("<client>"),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }

    fn url(peer: &str, route: &str) -> String {
        format!("{peer}{API_PREFIX}{route}")
    }
}

fn classify(peer: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout(peer.to_string());
    }
    match err.status() {
        Some(status) => TransportError::Status {
            peer: peer.to_string(),
            status: status.as_u16(),
        },
        None => TransportError::Request {
            peer: peer.to_string(),
            reason: err.to_string(),
        },
    }
}

#[async_trait]
impl PeerTransport for HttpTransport {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainDump, TransportError> {
        self.client
            .get(Self::url(peer, "/chain/"))
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| classify(peer, e))?
            .json::<ChainDump>()
            .await
            .map_err(|e| classify(peer, e))
    }

    async fn announce_block(&self, peer: &str, block: &Block) -> Result<(), TransportError> {
        self.client
            .post(Self::url(peer, "/add_block/"))
            .json(block)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| classify(peer, e))?;
        Ok(())
    }

    async fn register_with(
        &self,
        peer: &str,
        own_address: &str,
    ) -> Result<ChainDump, TransportError> {
        let body = RegisterRequest {
            node_address: own_address.to_string(),
        };
        self.client
            .post(Self::url(peer, "/register_node/"))
            .json(&body)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| classify(peer, e))?
            .json::<ChainDump>()
            .await
            .map_err(|e| classify(peer, e))
    }
}
