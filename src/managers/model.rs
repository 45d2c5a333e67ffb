use crate::config::Endpoints;
use crate::constants::model::{DEFINITION_EXTENSION, RULE_WIDTH};
use crate::errors::ToolError;
use crate::services::executor::{ApiExecutor, ApiReply};
use crate::services::logger::Logger;
use crate::services::poller::OperationPoller;
use crate::services::tool_executor::{required_str, ToolHandler};
use crate::utils::text::rule;
use async_trait::async_trait;
use base64::Engine;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

pub struct ModelManager {
    logger: Logger,
    executor: Arc<ApiExecutor>,
    poller: Arc<OperationPoller>,
    endpoints: Endpoints,
}

impl ModelManager {
    pub fn new(
        logger: Logger,
        executor: Arc<ApiExecutor>,
        poller: Arc<OperationPoller>,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            logger: logger.child("model"),
            executor,
            poller,
            endpoints,
        }
    }

    pub async fn get_model_definition(
        &self,
        workspace_id: &str,
        dataset_id: &str,
    ) -> Result<String, ToolError> {
        let url = self.endpoints.fabric(&[
            "workspaces",
            workspace_id,
            "semanticModels",
            dataset_id,
            "getDefinition",
        ])?;
        let definition = match self
            .executor
            .request_operation(&url, Method::POST, None)
            .await?
        {
            ApiReply::Json(body) => body,
            ApiReply::Accepted(handle) => self.poller.await_completion(&handle).await?,
        };

        let parts = definition
            .get("definition")
            .and_then(|d| d.get("parts"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        self.logger.debug(
            "Model definition received",
            Some(&serde_json::json!({ "dataset_id": dataset_id, "parts": parts.len() })),
        );
        if parts.is_empty() {
            return Ok("No model definition found".to_string());
        }
        Ok(render_definition(parts))
    }
}

/// Only `.tmdl` parts are rendered; a part that fails to decode gets an
/// inline note and the rest still render.
pub fn render_definition(parts: &[Value]) -> String {
    let mut out = format!(
        "Dataset Model Definition (TMDL Format)\n{}\n\n",
        rule('=', RULE_WIDTH)
    );
    let banner = rule('─', RULE_WIDTH);
    for part in parts {
        let path = part.get("path").and_then(Value::as_str).unwrap_or("");
        if !path.ends_with(DEFINITION_EXTENSION) {
            continue;
        }
        let payload = part.get("payload").and_then(Value::as_str).unwrap_or("");
        match decode_payload(payload) {
            Ok(content) => {
                out.push_str(&format!("\n{}\nFile: {}\n{}\n", banner, path, banner));
                out.push_str(&content);
                out.push('\n');
            }
            Err(err) => out.push_str(&format!("\nError decoding {}: {}\n", path, err)),
        }
    }
    out
}

fn decode_payload(payload: &str) -> Result<String, ToolError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|err| ToolError::decode(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| ToolError::decode(err.to_string()))
}

pub struct GetModelDefinitionTool(pub Arc<ModelManager>);

#[async_trait]
impl ToolHandler for GetModelDefinitionTool {
    async fn handle(&self, args: Value) -> Result<String, ToolError> {
        self.0
            .get_model_definition(
                required_str(&args, "workspace_id")?,
                required_str(&args, "dataset_id")?,
            )
            .await
    }
}
