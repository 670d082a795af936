mod api;
mod blockchain;
mod config;
mod error;
mod network;
mod node;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::{info, warn};
use std::sync::Arc;

use config::NodeConfig;
use network::HttpTransport;
use node::Node;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = NodeConfig::from_env();
    let transport = HttpTransport::new(config.peer_timeout).map_err(std::io::Error::other)?;
    let node = web::Data::new(Node::new(&config.node_url, config.difficulty, Arc::new(transport)));

    for peer in &config.bootstrap_peers {
        if let Err(e) = node.add_peer(peer) {
            warn!("skipping bootstrap peer: {}", e);
        }
    }

    info!(
        "⛓️ Starting node {} at http://{}:{}",
        node.address(),
        config.host,
        config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(node.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
