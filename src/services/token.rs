use crate::config::{Credential, Endpoints};
use crate::constants::limits::LOG_BODY_MAX_BYTES;
use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::utils::text::truncate_utf8_prefix;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub obtained_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<Value>,
}

/// Owns the single cached bearer token for the process.
///
/// The cache is never checked for staleness: a token is replaced only when
/// none is cached yet or when a caller forces [`TokenManager::obtain_token`]
/// after an authorization failure. Concurrent refreshes may each hit the
/// identity endpoint; writes to the cache are serialized by the lock.
pub struct TokenManager {
    logger: Logger,
    client: Client,
    credential: Result<Credential, ToolError>,
    endpoints: Endpoints,
    cache: RwLock<Option<AccessToken>>,
}

impl TokenManager {
    pub fn new(
        logger: Logger,
        client: Client,
        credential: Result<Credential, ToolError>,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            logger: logger.child("token"),
            client,
            credential,
            endpoints,
            cache: RwLock::new(None),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credential.is_ok()
    }

    pub async fn current(&self) -> Option<AccessToken> {
        self.cache.read().await.clone()
    }

    pub async fn ensure_token(&self) -> Result<AccessToken, ToolError> {
        if let Some(token) = self.current().await {
            return Ok(token);
        }
        self.obtain_token().await
    }

    /// Runs the client-credentials exchange and replaces the cached token.
    /// On any failure the previously cached token is left in place.
    pub async fn obtain_token(&self) -> Result<AccessToken, ToolError> {
        let credential = self.credential.as_ref().map_err(Clone::clone)?;
        let url = self.endpoints.token_url(&credential.tenant_id)?;

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", credential.client_id.as_str()),
            ("client_secret", credential.client_secret.as_str()),
            ("scope", credential.scope.as_str()),
        ];
        let response = self
            .client
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|err| {
                self.logger.error(
                    "Token request failed",
                    Some(&serde_json::json!({ "error": err.to_string() })),
                );
                ToolError::auth(format!("Token request failed: {}", err))
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| ToolError::auth(format!("Token response unreadable: {}", err)))?;

        if !status.is_success() {
            self.logger.error(
                "Token error",
                Some(&serde_json::json!({
                    "status": status.as_u16(),
                    "body": truncate_utf8_prefix(&text, LOG_BODY_MAX_BYTES),
                })),
            );
            return Err(ToolError::auth_status(status.as_u16(), &text));
        }

        let parsed: TokenResponse = serde_json::from_str(&text)
            .map_err(|_| ToolError::auth("Token response is not valid JSON"))?;
        let value = parsed
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| ToolError::auth("Token response did not include access_token"))?;

        let token = AccessToken {
            value,
            obtained_at: Utc::now(),
        };
        *self.cache.write().await = Some(token.clone());

        self.logger.info(
            "Token obtained successfully",
            Some(&serde_json::json!({
                "expires_in": parsed.expires_in.unwrap_or_else(|| Value::String("unknown".to_string())),
            })),
        );
        Ok(token)
    }
}
