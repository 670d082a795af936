use actix_web::{HttpResponse, Responder, get, post, web};
use log::{info, warn};

use super::models::{AddBlockResponse, ConsensusResponse, MineResponse, ValidateResponse};
use crate::blockchain::Block;
use crate::error::NodeError;
use crate::network::Resolution;
use crate::node::{MineOutcome, Node};

/// Get the full blockchain, its length and our peers.
#[get("/chain/")]
pub async fn get_chain(node: web::Data<Node>) -> impl Responder {
    HttpResponse::Ok().json(node.chain_dump())
}

/// Validate the whole chain.
#[get("/validate/")]
pub async fn validate_chain(node: web::Data<Node>) -> impl Responder {
    let (valid, length) = node.validate();
    HttpResponse::Ok().json(ValidateResponse {
        valid,
        length,
        difficulty: node.difficulty(),
    })
}

/// Mine the pending pool, then run consensus and announce the block.
#[get("/mine/")]
pub async fn mine_block(node: web::Data<Node>) -> Result<HttpResponse, NodeError> {
    let outcome = node.mine().await?;
    let message = match &outcome {
        MineOutcome::NothingToMine => String::from("no transactions to mine"),
        MineOutcome::Mined { index, .. } => format!("Block #{index} has been mined"),
    };
    Ok(HttpResponse::Ok().json(MineResponse { message, outcome }))
}

/// Admit a block announced by a peer.
#[post("/add_block/")]
pub async fn add_block(
    node: web::Data<Node>,
    block: web::Json<Block>,
) -> Result<HttpResponse, NodeError> {
    let index = node.receive_block(block.into_inner()).inspect_err(|e| {
        warn!("POST /add_block/ - {}", e);
    })?;
    Ok(HttpResponse::Created().json(AddBlockResponse {
        message: "Block added to the chain",
        index,
    }))
}

/// Run longest-chain resolution against every known peer.
#[post("/consensus/")]
pub async fn resolve_conflicts(node: web::Data<Node>) -> impl Responder {
    let resp = match node.resolve_conflicts().await {
        Resolution::Adopted { peer, length } => {
            info!("POST /consensus/ - adopted chain of {} from {}", length, peer);
            ConsensusResponse {
                adopted: true,
                length,
                peer: Some(peer),
            }
        }
        Resolution::Unchanged => ConsensusResponse {
            adopted: false,
            length: node.len(),
            peer: None,
        },
    };
    HttpResponse::Ok().json(resp)
}
