use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::blockchain::{BlockRejection, ChainRejection, TransactionError};
use crate::network::{InvalidPeerAddress, TransportError};

pub type Result<T> = std::result::Result<T, NodeError>;

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("invalid transaction: {0}")]
    InvalidTransaction(#[from] TransactionError),

    #[error("a mining attempt is already in progress")]
    MiningInProgress,

    #[error("mining abandoned: the chain moved on")]
    MiningAbandoned,

    #[error("mined block no longer fits the chain: {0}")]
    MiningRejected(BlockRejection),

    #[error("miner thread failed: {0}")]
    Miner(String),

    #[error("the block was discarded by the node: {0}")]
    Rejected(#[from] BlockRejection),

    #[error("the chain dump is tampered: {0}")]
    TamperedChain(#[from] ChainRejection),

    #[error(transparent)]
    InvalidPeerAddress(#[from] InvalidPeerAddress),

    #[error(transparent)]
    Peer(#[from] TransportError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for NodeError {
    fn status_code(&self) -> StatusCode {
        match self {
            NodeError::InvalidTransaction(_)
            | NodeError::Rejected(_)
            | NodeError::InvalidPeerAddress(_) => StatusCode::BAD_REQUEST,
            NodeError::MiningInProgress
            | NodeError::MiningAbandoned
            | NodeError::MiningRejected(_) => StatusCode::CONFLICT,
            NodeError::TamperedChain(_) | NodeError::Peer(_) => StatusCode::BAD_GATEWAY,
            NodeError::Miner(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}
