use crate::config::Settings;
use crate::constants::network::{TIMEOUT_CONNECTION_MS, USER_AGENT};
use crate::errors::ToolError;
use crate::managers;
use crate::mcp::catalog::tool_catalog;
use crate::services::executor::ApiExecutor;
use crate::services::logger::Logger;
use crate::services::poller::OperationPoller;
use crate::services::token::TokenManager;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub struct App {
    pub logger: Logger,
    pub settings: Settings,
    pub tokens: Arc<TokenManager>,
    pub tool_executor: Arc<ToolExecutor>,
}

impl App {
    fn validate_tool_wiring(
        handlers: &HashMap<String, Arc<dyn ToolHandler>>,
    ) -> Result<(), ToolError> {
        let mut missing: Vec<String> = tool_catalog()
            .iter()
            .filter(|tool| !handlers.contains_key(&tool.name))
            .map(|tool| tool.name.clone())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_details(serde_json::json!({ "missing_tools": missing })))
    }

    pub fn initialize(settings: Settings) -> Result<Self, ToolError> {
        Self::initialize_with_logger(Logger::new("powerbi"), settings)
    }

    pub fn initialize_with_logger(logger: Logger, settings: Settings) -> Result<Self, ToolError> {
        let client = Client::builder()
            .timeout(settings.http_timeout)
            .connect_timeout(Duration::from_millis(TIMEOUT_CONNECTION_MS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| ToolError::internal(format!("Failed to build HTTP client: {}", err)))?;

        let tokens = Arc::new(TokenManager::new(
            logger.clone(),
            client.clone(),
            settings.credential.clone(),
            settings.endpoints.clone(),
        ));
        let executor = Arc::new(ApiExecutor::new(
            logger.clone(),
            client,
            tokens.clone(),
            settings.poll.default_interval,
        ));
        let poller = Arc::new(OperationPoller::new(
            logger.clone(),
            executor.clone(),
            settings.poll.max_attempts,
        ));

        let workspace_manager = Arc::new(managers::workspaces::WorkspaceManager::new(
            logger.clone(),
            executor.clone(),
            settings.endpoints.clone(),
        ));
        let model_manager = Arc::new(managers::model::ModelManager::new(
            logger.clone(),
            executor.clone(),
            poller,
            settings.endpoints.clone(),
        ));
        let query_manager = Arc::new(managers::query::QueryManager::new(
            logger.clone(),
            executor,
            settings.endpoints.clone(),
        ));
        let connection_manager = Arc::new(managers::connection::ConnectionManager::new(
            logger.clone(),
            tokens.clone(),
        ));

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        handlers.insert(
            "list_workspaces".to_string(),
            Arc::new(managers::workspaces::ListWorkspacesTool(workspace_manager.clone())),
        );
        handlers.insert(
            "list_datasets".to_string(),
            Arc::new(managers::workspaces::ListDatasetsTool(workspace_manager)),
        );
        handlers.insert(
            "get_model_definition".to_string(),
            Arc::new(managers::model::GetModelDefinitionTool(model_manager)),
        );
        handlers.insert(
            "execute_dax_query".to_string(),
            Arc::new(managers::query::ExecuteDaxQueryTool(query_manager)),
        );
        handlers.insert(
            "test_connection".to_string(),
            Arc::new(managers::connection::TestConnectionTool(connection_manager)),
        );
        Self::validate_tool_wiring(&handlers)?;

        let tool_executor = Arc::new(ToolExecutor::new(logger.clone(), handlers));

        Ok(Self {
            logger,
            settings,
            tokens,
            tool_executor,
        })
    }

    /// One token exchange at startup; failure is logged and otherwise ignored.
    pub async fn probe_token(&self) {
        if !self.tokens.is_configured() {
            self.logger.warn(
                "Credentials incomplete, skipping startup token probe",
                Some(&self.settings.environment_check()),
            );
            return;
        }
        match self.tokens.obtain_token().await {
            Ok(_) => self.logger.info("Startup token probe succeeded", None),
            Err(err) => self.logger.warn(
                "Startup token probe failed",
                Some(&serde_json::json!({ "error": err })),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_tool_has_a_handler() {
        let settings = Settings::from_lookup(&|_: &str| None).expect("settings");
        let app = App::initialize(settings).expect("app");
        for tool in tool_catalog() {
            assert!(app.tool_executor.has_tool(&tool.name), "{} is unwired", tool.name);
        }
    }
}
