use crate::constants::limits::ERROR_BODY_MAX_BYTES;
use crate::utils::text::truncate_utf8_prefix;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    Config,
    Auth,
    Api,
    Network,
    Timeout,
    Validation,
    Decode,
    NotFound,
    Internal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            status: None,
            details: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn config(missing: &[&str]) -> Self {
        Self::new(
            ToolErrorKind::Config,
            "CONFIG",
            format!(
                "Authentication unavailable: missing environment variables {}",
                missing.join(", ")
            ),
        )
        .with_details(serde_json::json!({ "missing": missing }))
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Auth, "AUTH", message)
    }

    pub fn auth_status(status: u16, body: &str) -> Self {
        Self::auth(format!(
            "Token request failed: HTTP {}: {}",
            status,
            truncate_utf8_prefix(body, ERROR_BODY_MAX_BYTES)
        ))
        .with_status(status)
    }

    pub fn api(status: u16, body: &str) -> Self {
        Self::new(
            ToolErrorKind::Api,
            "API",
            format!(
                "HTTP {}: {}",
                status,
                truncate_utf8_prefix(body, ERROR_BODY_MAX_BYTES)
            ),
        )
        .with_status(status)
    }

    pub fn api_message(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Api, "API", message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Network, "NETWORK", message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Timeout, "TIMEOUT", message)
    }

    pub fn validation(tool: &str, missing: &[String]) -> Self {
        let noun = if missing.len() == 1 {
            "argument"
        } else {
            "arguments"
        };
        Self::new(
            ToolErrorKind::Validation,
            "MISSING_ARGUMENT",
            format!(
                "Missing required {} for {}: {}",
                noun,
                tool,
                missing.join(", ")
            ),
        )
        .with_details(serde_json::json!({ "tool": tool, "missing": missing }))
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Decode, "DECODE", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, "NOT_FOUND", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal, "INTERNAL", message)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ToolErrorKind::Api && self.status == Some(401)
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ToolError {}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::internal(err.to_string())
    }
}
