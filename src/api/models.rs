use serde::Serialize;

use crate::blockchain::Transaction;
use crate::node::MineOutcome;

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub message: String,
    #[serde(flatten)]
    pub outcome: MineOutcome,
}

#[derive(Serialize)]
pub struct AddBlockResponse {
    pub message: &'static str,
    pub index: u64,
}

#[derive(Serialize)]
pub struct ConsensusResponse {
    pub adopted: bool,
    pub length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer: Option<String>,
}

/* ---------- TX API Models ---------- */

#[derive(Serialize)]
pub struct NewTxResponse {
    pub message: &'static str,
    pub transaction: Transaction,
}

/* ---------- Peer API Models ---------- */

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub length: usize,
    pub peers: Vec<String>,
}
