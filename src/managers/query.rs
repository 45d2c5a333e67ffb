use crate::config::Endpoints;
use crate::errors::ToolError;
use crate::services::executor::ApiExecutor;
use crate::services::logger::Logger;
use crate::services::tool_executor::{required_str, ToolHandler};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

pub struct QueryManager {
    logger: Logger,
    executor: Arc<ApiExecutor>,
    endpoints: Endpoints,
}

impl QueryManager {
    pub fn new(logger: Logger, executor: Arc<ApiExecutor>, endpoints: Endpoints) -> Self {
        Self {
            logger: logger.child("query"),
            executor,
            endpoints,
        }
    }

    pub async fn execute_dax_query(
        &self,
        workspace_id: &str,
        dataset_id: &str,
        query: &str,
    ) -> Result<String, ToolError> {
        let url = self.endpoints.powerbi(&[
            "groups",
            workspace_id,
            "datasets",
            dataset_id,
            "executeQueries",
        ])?;
        let body = serde_json::json!({ "queries": [ { "query": query } ] });
        self.logger.debug(
            "Executing DAX query",
            Some(&serde_json::json!({ "dataset_id": dataset_id, "query_bytes": query.len() })),
        );
        let response = self.executor.request(&url, Method::POST, Some(&body)).await?;
        render_tables(&response)
    }
}

fn render_tables(response: &Value) -> Result<String, ToolError> {
    let tables = response
        .get("results")
        .and_then(Value::as_array)
        .and_then(|results| results.first())
        .and_then(|first| first.get("tables"));
    match tables {
        Some(tables) => Ok(serde_json::to_string_pretty(tables)?),
        None => Ok("No data returned".to_string()),
    }
}

pub struct ExecuteDaxQueryTool(pub Arc<QueryManager>);

#[async_trait]
impl ToolHandler for ExecuteDaxQueryTool {
    async fn handle(&self, args: Value) -> Result<String, ToolError> {
        self.0
            .execute_dax_query(
                required_str(&args, "workspace_id")?,
                required_str(&args, "dataset_id")?,
                required_str(&args, "query")?,
            )
            .await
    }
}
