use crate::constants::service::NAME;
use crate::errors::McpError;
use crate::mcp::server::McpServer;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use std::sync::Arc;

pub type SharedServer = Arc<McpServer>;

impl IntoResponse for McpError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub async fn mcp_endpoint(
    State(server): State<SharedServer>,
    body: Bytes,
) -> Result<Json<Value>, McpError> {
    server.handle_body(&body).await.map(Json)
}

pub async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "healthy", "service": NAME }))
}

pub async fn connection_test(State(server): State<SharedServer>) -> Json<Value> {
    let text = server.connection_test().await;
    Json(serde_json::json!({ "service": NAME, "connection_test": text }))
}

pub async fn index(State(server): State<SharedServer>) -> Json<Value> {
    Json(serde_json::json!({
        "service": NAME,
        "status": "running",
        "endpoints": {
            "mcp": "/api/mcp-endpoint",
            "health": "/api/health",
            "test": "/api/test",
        },
        "environment_check": server.app().settings.environment_check(),
    }))
}
