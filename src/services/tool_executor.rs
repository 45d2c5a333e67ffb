use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ToolError;
use crate::mcp::catalog::validate_tool_args;
use crate::mcp::envelope::{error_envelope, text_envelope};
use crate::services::logger::Logger;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, args: Value) -> Result<String, ToolError>;
}

#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("dispatch"),
            handlers: Arc::new(handlers),
        }
    }

    pub fn has_tool(&self, tool: &str) -> bool {
        self.handlers.contains_key(tool)
    }

    /// Arguments are checked against the catalog schema before the handler
    /// runs, so a validation failure never reaches the network.
    pub async fn execute(&self, tool: &str, args: Value) -> Result<String, ToolError> {
        let handler = self
            .handlers
            .get(tool)
            .cloned()
            .ok_or_else(|| ToolError::not_found(format!("Unknown tool: {}", tool)))?;

        let args = match args {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        validate_tool_args(tool, &args)?;

        let trace_id = uuid::Uuid::new_v4().to_string();
        let started_at = chrono::Utc::now().timestamp_millis();
        self.logger.debug(
            "Tool call started",
            Some(&serde_json::json!({ "tool": tool, "trace_id": trace_id })),
        );

        let result = handler.handle(args).await;
        let duration_ms = chrono::Utc::now().timestamp_millis() - started_at;
        match &result {
            Ok(text) => self.logger.info(
                "Tool call finished",
                Some(&serde_json::json!({
                    "tool": tool,
                    "trace_id": trace_id,
                    "duration_ms": duration_ms,
                    "output_bytes": text.len(),
                })),
            ),
            Err(err) => self.logger.warn(
                "Tool call failed",
                Some(&serde_json::json!({
                    "tool": tool,
                    "trace_id": trace_id,
                    "duration_ms": duration_ms,
                    "error": err,
                })),
            ),
        }
        result
    }

    /// Every outcome, success or failure, comes back as an envelope value.
    pub async fn handle_tool_call(&self, tool: &str, args: Value) -> Value {
        match self.execute(tool, args).await {
            Ok(text) => text_envelope(&text),
            Err(err) => error_envelope(&err.message),
        }
    }
}

/// Reads a string argument that the catalog schema has already required.
pub fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ToolError::internal(format!("Argument '{}' was not validated", key)))
}
