use actix_web::{HttpResponse, post, web};
use log::info;

use super::models::RegisterResponse;
use crate::error::NodeError;
use crate::network::RegisterRequest;
use crate::node::Node;

/// A remote node announces itself; answer with our chain so it can sync.
#[post("/register_node/")]
pub async fn register_node(
    node: web::Data<Node>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, NodeError> {
    let dump = node.register_node(&body.node_address)?;
    Ok(HttpResponse::Ok().json(dump))
}

/// Ask this node to join the network through `node_address`.
#[post("/register_with/")]
pub async fn register_with(
    node: web::Data<Node>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, NodeError> {
    let length = node.register_with(&body.node_address).await?;
    info!("POST /register_with/ - synced {} blocks from {}", length, body.node_address);
    Ok(HttpResponse::Ok().json(RegisterResponse {
        message: "registration complete",
        length,
        peers: node.peer_addresses(),
    }))
}
