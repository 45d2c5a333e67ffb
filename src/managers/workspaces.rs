use crate::config::Endpoints;
use crate::errors::ToolError;
use crate::services::executor::ApiExecutor;
use crate::services::logger::Logger;
use crate::services::tool_executor::{required_str, ToolHandler};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

pub struct WorkspaceManager {
    logger: Logger,
    executor: Arc<ApiExecutor>,
    endpoints: Endpoints,
}

impl WorkspaceManager {
    pub fn new(logger: Logger, executor: Arc<ApiExecutor>, endpoints: Endpoints) -> Self {
        Self {
            logger: logger.child("workspaces"),
            executor,
            endpoints,
        }
    }

    pub async fn list_workspaces(&self) -> Result<String, ToolError> {
        let url = self.endpoints.powerbi(&["groups"])?;
        let body = self.executor.request(&url, Method::GET, None).await?;
        let items = collection(&body);
        self.logger
            .debug("Workspaces listed", Some(&serde_json::json!({ "count": items.len() })));
        if items.is_empty() {
            return Ok("No workspaces found".to_string());
        }
        Ok(format_listing("workspaces", items))
    }

    pub async fn list_datasets(&self, workspace_id: &str) -> Result<String, ToolError> {
        let url = self
            .endpoints
            .powerbi(&["groups", workspace_id, "datasets"])?;
        let body = self.executor.request(&url, Method::GET, None).await?;
        let items = collection(&body);
        self.logger.debug(
            "Datasets listed",
            Some(&serde_json::json!({ "workspace_id": workspace_id, "count": items.len() })),
        );
        if items.is_empty() {
            return Ok("No datasets found in this workspace".to_string());
        }
        Ok(format_listing("datasets", items))
    }
}

fn collection(body: &Value) -> &[Value] {
    body.get("value")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn format_listing(noun: &str, items: &[Value]) -> String {
    let mut out = format!("Found {} {}:\n\n", items.len(), noun);
    for item in items {
        out.push_str(&format!(
            "• {} (ID: {})\n",
            display_field(item, "name"),
            display_field(item, "id")
        ));
    }
    out
}

fn display_field(item: &Value, key: &str) -> String {
    match item.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

pub struct ListWorkspacesTool(pub Arc<WorkspaceManager>);

#[async_trait]
impl ToolHandler for ListWorkspacesTool {
    async fn handle(&self, _args: Value) -> Result<String, ToolError> {
        self.0.list_workspaces().await
    }
}

pub struct ListDatasetsTool(pub Arc<WorkspaceManager>);

#[async_trait]
impl ToolHandler for ListDatasetsTool {
    async fn handle(&self, args: Value) -> Result<String, ToolError> {
        self.0.list_datasets(required_str(&args, "workspace_id")?).await
    }
}
