use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::services::token::TokenManager;
use crate::services::tool_executor::ToolHandler;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const CONNECTION_OK: &str = "Authentication successful! Token obtained and ready to use.";
pub const CONNECTION_FAILED: &str = "Authentication failed! Check your client credentials.";

pub struct ConnectionManager {
    logger: Logger,
    tokens: Arc<TokenManager>,
}

impl ConnectionManager {
    pub fn new(logger: Logger, tokens: Arc<TokenManager>) -> Self {
        Self {
            logger: logger.child("connection"),
            tokens,
        }
    }

    /// Always performs a fresh exchange; the outcome is text either way.
    pub async fn test_connection(&self) -> String {
        match self.tokens.obtain_token().await {
            Ok(_) => CONNECTION_OK.to_string(),
            Err(err) => {
                self.logger.warn(
                    "Connection test failed",
                    Some(&serde_json::json!({ "error": err })),
                );
                CONNECTION_FAILED.to_string()
            }
        }
    }
}

pub struct TestConnectionTool(pub Arc<ConnectionManager>);

#[async_trait]
impl ToolHandler for TestConnectionTool {
    async fn handle(&self, _args: Value) -> Result<String, ToolError> {
        Ok(self.0.test_connection().await)
    }
}
