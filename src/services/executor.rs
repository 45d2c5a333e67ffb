use crate::constants::limits::LOG_BODY_MAX_BYTES;
use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::services::token::TokenManager;
use crate::utils::text::truncate_utf8_prefix;
use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationHandle {
    pub status_url: Url,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone)]
pub enum ApiReply {
    Json(Value),
    Accepted(OperationHandle),
}

pub struct ApiExecutor {
    logger: Logger,
    client: Client,
    tokens: Arc<TokenManager>,
    default_retry_after: Duration,
}

impl ApiExecutor {
    pub fn new(
        logger: Logger,
        client: Client,
        tokens: Arc<TokenManager>,
        default_retry_after: Duration,
    ) -> Self {
        Self {
            logger: logger.child("api"),
            client,
            tokens,
            default_retry_after,
        }
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    pub async fn request(
        &self,
        url: &Url,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value, ToolError> {
        let response = self.send_authorized(url, method, body).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.status_error(url, response).await);
        }
        read_json(response).await
    }

    /// Like [`ApiExecutor::request`], but a `202 Accepted` is handed back as an
    /// [`OperationHandle`] instead of being read as the final body.
    pub async fn request_operation(
        &self,
        url: &Url,
        method: Method,
        body: Option<&Value>,
    ) -> Result<ApiReply, ToolError> {
        let response = self.send_authorized(url, method, body).await?;
        let status = response.status();
        if status == StatusCode::ACCEPTED {
            let handle = operation_handle(url, response.headers(), self.default_retry_after)?;
            self.logger.info(
                "Long-running operation accepted",
                Some(&serde_json::json!({
                    "status_url": handle.status_url.as_str(),
                    "retry_after_secs": handle.poll_interval.as_secs(),
                })),
            );
            return Ok(ApiReply::Accepted(handle));
        }
        if !status.is_success() {
            return Err(self.status_error(url, response).await);
        }
        read_json(response).await.map(ApiReply::Json)
    }

    async fn send_authorized(
        &self,
        url: &Url,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Response, ToolError> {
        let token = self.tokens.ensure_token().await?;
        let response = self.send_once(url, &method, body, &token.value).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        self.logger.warn(
            "Unauthorized response, refreshing token and retrying once",
            Some(&serde_json::json!({ "method": method.as_str(), "url": url.as_str() })),
        );
        let token = self.tokens.obtain_token().await?;
        self.send_once(url, &method, body, &token.value).await
    }

    async fn send_once(
        &self,
        url: &Url,
        method: &Method,
        body: Option<&Value>,
        token: &str,
    ) -> Result<Response, ToolError> {
        self.logger.debug(
            "HTTP request",
            Some(&serde_json::json!({ "method": method.as_str(), "url": url.as_str() })),
        );
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(map_reqwest_error)
    }

    async fn status_error(&self, url: &Url, response: Response) -> ToolError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        self.logger.warn(
            "HTTP error response",
            Some(&serde_json::json!({
                "url": url.as_str(),
                "status": status,
                "body": truncate_utf8_prefix(&text, LOG_BODY_MAX_BYTES),
            })),
        );
        ToolError::api(status, &text)
    }
}

async fn read_json(response: Response) -> Result<Value, ToolError> {
    let text = response.text().await.map_err(map_reqwest_error)?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text)
        .map_err(|err| ToolError::api_message(format!("Response body is not valid JSON: {}", err)))
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ToolError {
    if err.is_timeout() {
        return ToolError::timeout(format!("HTTP request timed out: {}", err));
    }
    ToolError::network(err.to_string())
}

pub(crate) fn operation_handle(
    request_url: &Url,
    headers: &HeaderMap,
    default_retry_after: Duration,
) -> Result<OperationHandle, ToolError> {
    let location = headers
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ToolError::api_message("202 Accepted response is missing a Location header"))?;
    let status_url = request_url.join(location).map_err(|err| {
        ToolError::api_message(format!("Invalid Location header '{}': {}", location, err))
    })?;
    let poll_interval = parse_retry_after(
        headers.get(RETRY_AFTER).and_then(|v| v.to_str().ok()),
        default_retry_after,
    );
    Ok(OperationHandle {
        status_url,
        poll_interval,
    })
}

pub(crate) fn parse_retry_after(raw: Option<&str>, fallback: Duration) -> Duration {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}
