use log::warn;
use std::env;
use std::time::Duration;

use crate::blockchain::{DEFAULT_DIFFICULTY, DIFF_MAX, DIFF_MIN};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_PEER_TIMEOUT_SECS: u64 = 5;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    /// Address advertised to peers when registering.
    pub node_url: String,
    /// Fixed for the lifetime of the process.
    pub difficulty: u32,
    pub peer_timeout: Duration,
    pub bootstrap_peers: Vec<String>,
}

impl NodeConfig {
    /// Read `HOST`, `PORT`, `NODE_URL`, `DIFFICULTY`, `PEER_TIMEOUT_SECS`
    /// and `PEERS` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT);
        let node_url = lookup("NODE_URL").unwrap_or_else(|| format!("http://{host}:{port}"));

        let difficulty: u32 = parse_or(&lookup, "DIFFICULTY", DEFAULT_DIFFICULTY);
        let clamped = difficulty.clamp(DIFF_MIN, DIFF_MAX);
        if clamped != difficulty {
            warn!("DIFFICULTY={difficulty} out of range, using {clamped}");
        }

        let peer_timeout =
            Duration::from_secs(parse_or(&lookup, "PEER_TIMEOUT_SECS", DEFAULT_PEER_TIMEOUT_SECS));

        let bootstrap_peers = lookup("PEERS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            host,
            port,
            node_url,
            difficulty: clamped,
            peer_timeout,
            bootstrap_peers,
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{key}={raw:?} is not valid, using default");
            default
        }),
    }
}
