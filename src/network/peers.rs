/// Peer address that is not an absolute http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid peer address: {0:?}")]
pub struct InvalidPeerAddress(pub String);

/// Trim whitespace and trailing slashes so `http://a:1/` and `http://a:1`
/// name the same peer.
pub fn normalize_address(raw: &str) -> Result<String, InvalidPeerAddress> {
    let address = raw.trim().trim_end_matches('/');
    let host = address
        .strip_prefix("http://")
        .or_else(|| address.strip_prefix("https://"));
    match host {
        Some(host) if !host.is_empty() => Ok(address.to_string()),
        _ => Err(InvalidPeerAddress(raw.to_string())),
    }
}

/// Known peers in the order they were first seen. That order is the
/// tie-break when two peers offer equally long chains.
#[derive(Debug, Default)]
pub struct PeerSet {
    own_address: String,
    peers: Vec<String>,
}

impl PeerSet {
    pub fn new(own_address: &str) -> Self {
        Self {
            own_address: own_address.trim_end_matches('/').to_string(),
            peers: Vec::new(),
        }
    }

    /// Returns `Ok(true)` if the peer is new.
    pub fn insert(&mut self, raw: &str) -> Result<bool, InvalidPeerAddress> {
        let address = normalize_address(raw)?;
        if address == self.own_address || self.peers.contains(&address) {
            return Ok(false);
        }
        self.peers.push(address);
        Ok(true)
    }

    pub fn addresses(&self) -> Vec<String> {
        self.peers.clone()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
