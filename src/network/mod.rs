pub mod consensus;
#[cfg(test)]
pub mod local_transport;
pub mod peers;
pub mod transport;

use serde::{Deserialize, Serialize};

use crate::blockchain::Block;

pub use consensus::Resolution;
pub use peers::{InvalidPeerAddress, PeerSet};
pub use transport::{HttpTransport, PeerTransport, TransportError};

/// API prefix every node serves its routes under.
pub const API_PREFIX: &str = "/api/v1";

/// What a node reports about itself when asked for its chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainDump {
    pub length: usize,
    pub chain: Vec<Block>,
    #[serde(default)]
    pub peers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub node_address: String,
}
