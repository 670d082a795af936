use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

use super::transaction::Transaction;
use super::{GENESIS_PREVIOUS_HASH, pow};

/// A single block in the blockchain holding a batch of transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub timestamp: i64, // Unix timestamp (UTC)
    pub previous_hash: String,
    pub nonce: u64, // Proof-of-Work nonce
    /// Set once the block is sealed; never part of its own digest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl Block {
    /// Create the genesis block (first block in the chain).
    ///
    /// Every field is fixed, so nodes running the same difficulty derive
    /// the exact same genesis and can exchange chains.
    pub fn genesis(difficulty: u32) -> Self {
        let mut block = Self {
            index: 0,
            transactions: Vec::new(),
            timestamp: 0,
            previous_hash: String::from(GENESIS_PREVIOUS_HASH),
            nonce: 0,
            hash: None,
        };
        let hash = pow::seal(&mut block, difficulty);
        block.hash = Some(hash);
        block
    }

    /// Create a new unsealed block. Run it through `pow::seal` and the
    /// chain's `append` to get it onto the chain.
    pub fn new(index: u64, previous_hash: String, transactions: Vec<Transaction>) -> Self {
        Self {
            index,
            transactions,
            timestamp: Utc::now().timestamp(),
            previous_hash,
            nonce: 0,
            hash: None,
        }
    }

    /// Compute the SHA-256 hash of this block over index, transactions,
    /// timestamp, previous_hash and nonce. The preimage is a JSON object
    /// whose keys are sorted at every level (serde_json's default map is
    /// a BTreeMap), so equal field values always give the same bytes.
    pub fn compute_hash(&self) -> String {
        let preimage = json!({
            "index": self.index,
            "nonce": self.nonce,
            "previous_hash": self.previous_hash,
            "timestamp": self.timestamp,
            "transactions": self.transactions,
        });
        let mut hasher = Sha256::new();
        hasher.update(preimage.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// The sealed hash, if the block has been mined.
    pub fn sealed_hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::Block;
    use crate::blockchain::Transaction;
    use crate::blockchain::validator::meets_difficulty;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn tx(author: &str, content: &str) -> Transaction {
        Transaction {
            author: author.into(),
            content: content.into(),
            timestamp: 1_700_000_000,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn genesis_is_sealed_and_fixed() {
        let g = Block::genesis(2);
        assert_eq!(g.index, 0);
        assert_eq!(g.previous_hash, "0");
        assert!(g.transactions.is_empty());
        assert_eq!(g.sealed_hash(), Some(g.compute_hash().as_str()));
        assert!(meets_difficulty(&g.compute_hash(), 2));
        assert_eq!(Block::genesis(2), g);
    }

    #[test]
    fn hash_ignores_stored_hash_field() {
        let mut b = Block::new(1, "prev".into(), vec![tx("alice", "hi")]);
        let unsealed = b.compute_hash();
        b.hash = Some("garbage".into());
        assert_eq!(b.compute_hash(), unsealed);
    }

    #[test]
    fn hash_is_independent_of_field_order() {
        let b = Block::new(3, "abc".into(), vec![tx("alice", "hi")]);
        let reordered: Block = serde_json::from_value(json!({
            "nonce": b.nonce,
            "transactions": [{
                "timestamp": 1_700_000_000,
                "content": "hi",
                "author": "alice"
            }],
            "previous_hash": "abc",
            "timestamp": b.timestamp,
            "index": 3
        }))
        .unwrap();
        assert_eq!(reordered.compute_hash(), b.compute_hash());
    }

    #[test]
    fn extra_transaction_fields_are_hashed_in_key_order() {
        let mut first = tx("alice", "hi");
        first.extra.insert("zeta".into(), json!(1));
        first.extra.insert("alpha".into(), json!("a"));
        let mut second = tx("alice", "hi");
        second.extra.insert("alpha".into(), json!("a"));
        second.extra.insert("zeta".into(), json!(1));

        let a = Block::new(1, "p".into(), vec![first]);
        let mut b = Block::new(1, "p".into(), vec![second]);
        b.timestamp = a.timestamp;
        assert_eq!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn hash_changes_when_content_changes() {
        let b = Block::new(2, "prev".into(), vec![tx("alice", "hi")]);
        let before = b.compute_hash();

        let mut tampered = b.clone();
        tampered.transactions.push(tx("mallory", "extra"));
        assert_ne!(before, tampered.compute_hash());

        let mut bumped = b.clone();
        bumped.nonce += 1;
        assert_ne!(before, bumped.compute_hash());
    }

    #[test]
    fn wire_format_round_trips_hash() {
        let g = Block::genesis(2);
        let wire = serde_json::to_string(&g).unwrap();
        let back: Block = serde_json::from_str(&wire).unwrap();
        assert_eq!(back.compute_hash(), g.compute_hash());
        assert_eq!(back.hash, g.hash);
    }

    #[test]
    fn extreme_float_fields_survive_the_wire() {
        let mut t = tx("alice", "hi");
        t.extra.insert("amount".into(), json!(1.0715660391465826e-75));
        t.extra.insert("huge".into(), json!(f64::MAX));
        t.extra.insert("tiny".into(), json!(f64::MIN_POSITIVE));
        t.extra.insert("third".into(), json!(0.1 + 0.2));
        let b = Block::new(1, "prev".into(), vec![t]);

        let wire = serde_json::to_string(&b).unwrap();
        let back: Block = serde_json::from_str(&wire).unwrap();
        assert_eq!(back.transactions[0].extra["amount"], json!(1.0715660391465826e-75));
        assert_eq!(back.compute_hash(), b.compute_hash());
    }
}
