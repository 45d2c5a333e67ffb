pub mod routes;

use crate::errors::McpError;
use crate::mcp::server::McpServer;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Every route is served bare and under `/api`.
pub fn router(server: Arc<McpServer>) -> Router {
    let api = Router::new()
        .route("/mcp-endpoint", post(routes::mcp_endpoint))
        .route("/health", get(routes::health))
        .route("/test", get(routes::connection_test));

    Router::new()
        .route("/", get(routes::index))
        .merge(api.clone())
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .with_state(server)
}

pub async fn serve(server: Arc<McpServer>, addr: SocketAddr) -> Result<(), McpError> {
    let logger = server.app().logger.child("http");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    logger.info(
        "HTTP relay listening",
        Some(&serde_json::json!({ "addr": addr.to_string() })),
    );
    axum::serve(listener, router(server)).await?;
    Ok(())
}
