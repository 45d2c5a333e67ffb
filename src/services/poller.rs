use crate::constants::polling::{RESULT_SEGMENT, STATUS_FAILED, STATUS_SUCCEEDED};
use crate::errors::{ToolError, ToolErrorKind};
use crate::services::executor::{ApiExecutor, OperationHandle};
use crate::services::logger::Logger;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

pub struct OperationPoller {
    logger: Logger,
    executor: Arc<ApiExecutor>,
    max_attempts: u32,
}

impl OperationPoller {
    pub fn new(logger: Logger, executor: Arc<ApiExecutor>, max_attempts: u32) -> Self {
        Self {
            logger: logger.child("poller"),
            executor,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Sleeps `poll_interval` before each status check and gives up after
    /// `max_attempts` non-terminal answers.
    pub async fn await_completion(&self, handle: &OperationHandle) -> Result<Value, ToolError> {
        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(handle.poll_interval).await;

            let status = self
                .executor
                .request(&handle.status_url, Method::GET, None)
                .await
                .map_err(|err| with_prefix(err, "Failed to check status"))?;
            let state = status.get("status").and_then(Value::as_str).unwrap_or("");
            self.logger.debug(
                "Operation status",
                Some(&serde_json::json!({
                    "status_url": handle.status_url.as_str(),
                    "attempt": attempt,
                    "status": state,
                })),
            );

            if state == STATUS_SUCCEEDED {
                let result_url = result_url(&handle.status_url)?;
                return self
                    .executor
                    .request(&result_url, Method::GET, None)
                    .await
                    .map_err(|err| with_prefix(err, "Failed to get result"));
            }
            if state == STATUS_FAILED {
                return Err(operation_failed(&status));
            }
        }

        self.logger.warn(
            "Operation timed out",
            Some(&serde_json::json!({
                "status_url": handle.status_url.as_str(),
                "attempts": self.max_attempts,
            })),
        );
        Err(ToolError::timeout(format!(
            "Operation timed out after {} status checks",
            self.max_attempts
        ))
        .with_details(serde_json::json!({ "status_url": handle.status_url.as_str() })))
    }
}

fn result_url(status_url: &Url) -> Result<Url, ToolError> {
    let mut url = status_url.clone();
    url.path_segments_mut()
        .map_err(|_| ToolError::internal(format!("Status URL {} has no path", status_url)))?
        .pop_if_empty()
        .push(RESULT_SEGMENT);
    Ok(url)
}

fn with_prefix(mut err: ToolError, prefix: &str) -> ToolError {
    err.message = format!("{}: {}", prefix, err.message);
    err
}

fn operation_failed(status: &Value) -> ToolError {
    let error = status.get("error").cloned().unwrap_or(Value::Null);
    let detail = match &error {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(error.to_string())),
        other => Some(other.to_string()),
    };
    let message = match detail {
        Some(detail) => format!("Operation failed: {}", detail),
        None => "Operation failed".to_string(),
    };
    ToolError::new(ToolErrorKind::Api, "OPERATION_FAILED", message).with_details(error)
}
