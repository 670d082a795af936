//! In-memory transport for tests: peer calls go straight to other
//! in-process nodes, or to canned chain reports.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{ChainDump, PeerTransport, TransportError};
use crate::blockchain::Block;
use crate::node::Node;

/// Shared by every node in a test network.
#[derive(Default)]
pub struct LocalTransport {
    nodes: Mutex<HashMap<String, Arc<Node>>>,
    canned: Mutex<HashMap<String, ChainDump>>,
    on_fetch: Mutex<Option<FetchHook>>,
}

type FetchHook = Box<dyn Fn(&str) + Send + Sync>;

impl LocalTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make `node` reachable at its own address.
    pub fn attach(&self, node: &Arc<Node>) {
        let mut nodes = self.nodes.lock().expect("mutex poisoned");
        nodes.insert(node.address().to_string(), node.clone());
    }

    /// Have `peer` answer chain requests with `dump`.
    pub fn serve_chain(&self, peer: &str, dump: ChainDump) {
        let mut canned = self.canned.lock().expect("mutex poisoned");
        canned.insert(peer.to_string(), dump);
    }

    /// Run `hook` with the peer address every time a chain is fetched.
    pub fn on_fetch(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        *self.on_fetch.lock().expect("mutex poisoned") = Some(Box::new(hook));
    }

    fn node(&self, peer: &str) -> Result<Arc<Node>, TransportError> {
        let nodes = self.nodes.lock().expect("mutex poisoned");
        nodes.get(peer).cloned().ok_or_else(|| unreachable_peer(peer))
    }
}

fn unreachable_peer(peer: &str) -> TransportError {
    TransportError::Request {
        peer: peer.to_string(),
        reason: String::from("no such peer"),
    }
}

#[async_trait]
impl PeerTransport for LocalTransport {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainDump, TransportError> {
        if let Some(hook) = self.on_fetch.lock().expect("mutex poisoned").as_ref() {
            hook(peer);
        }
        if let Some(dump) = self.canned.lock().expect("mutex poisoned").get(peer) {
            return Ok(dump.clone());
        }
        Ok(self.node(peer)?.chain_dump())
    }

    async fn announce_block(&self, peer: &str, block: &Block) -> Result<(), TransportError> {
        self.node(peer)?
            .receive_block(block.clone())
            .map(|_| ())
            .map_err(|e| TransportError::Request {
                peer: peer.to_string(),
                reason: e.to_string(),
            })
    }

    async fn register_with(
        &self,
        peer: &str,
        own_address: &str,
    ) -> Result<ChainDump, TransportError> {
        self.node(peer)?
            .register_node(own_address)
            .map_err(|e| TransportError::Request {
                peer: peer.to_string(),
                reason: e.to_string(),
            })
    }
}
