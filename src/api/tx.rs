use actix_web::{HttpResponse, Responder, get, post, web};
use log::{info, warn};
use serde_json::{Map, Value};

use super::models::NewTxResponse;
use crate::error::NodeError;
use crate::node::Node;

/// Submit a new transaction into the pending pool.
#[post("/new_transaction/")]
pub async fn post_transaction(
    node: web::Data<Node>,
    body: web::Json<Map<String, Value>>,
) -> Result<HttpResponse, NodeError> {
    let tx = node.submit_transaction(body.into_inner()).inspect_err(|e| {
        warn!("POST /new_transaction/ - rejected: {}", e);
    })?;
    info!("POST /new_transaction/ - queued transaction from {}", tx.author);
    Ok(HttpResponse::Created().json(NewTxResponse {
        message: "SUCCESS",
        transaction: tx,
    }))
}

/// List transactions waiting to be mined, oldest first.
#[get("/pending/")]
pub async fn get_pending(node: web::Data<Node>) -> impl Responder {
    HttpResponse::Ok().json(node.pending_transactions())
}
