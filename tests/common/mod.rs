#![allow(dead_code)]

use powerbi_mcp::app::App;
use powerbi_mcp::config::{Credential, Endpoints, Settings};
use powerbi_mcp::mcp::server::McpServer;
use powerbi_mcp::services::logger::{LogLevel, Logger};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TENANT: &str = "tenant-1";
pub const TOKEN_PATH: &str = "/tenant-1/oauth2/v2.0/token";

pub fn credential() -> Credential {
    Credential {
        client_id: "client-1".to_string(),
        client_secret: "secret-1".to_string(),
        tenant_id: TENANT.to_string(),
        scope: "https://analysis.windows.net/powerbi/api/.default".to_string(),
    }
}

pub fn endpoints(mock: &MockServer) -> Endpoints {
    let base = mock.uri();
    Endpoints {
        authority_host: Url::parse(&base).expect("mock url"),
        powerbi_api: Url::parse(&format!("{}/v1.0/myorg", base)).expect("mock url"),
        fabric_api: Url::parse(&format!("{}/v1", base)).expect("mock url"),
    }
}

pub fn settings(mock: &MockServer) -> Settings {
    let mut settings = Settings::with_credential(credential(), endpoints(mock));
    settings.poll.default_interval = Duration::ZERO;
    settings.http_timeout = Duration::from_secs(5);
    settings
}

pub fn quiet_logger() -> Logger {
    Logger::with_level("test", LogLevel::Error)
}

pub fn app(settings: Settings) -> App {
    App::initialize_with_logger(quiet_logger(), settings).expect("app")
}

pub fn server(settings: Settings) -> Arc<McpServer> {
    Arc::new(McpServer::new(Arc::new(app(settings))))
}

pub fn token_body(token: &str) -> serde_json::Value {
    serde_json::json!({
        "token_type": "Bearer",
        "expires_in": 3599,
        "access_token": token,
    })
}

/// Identity endpoint that always hands out `token`.
pub async fn mount_token(mock: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(token)))
        .mount(mock)
        .await;
}
