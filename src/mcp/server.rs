use crate::app::App;
use crate::config::Settings;
use crate::constants::service::{PROTOCOL_VERSION, SERVER_NAME, VERSION};
use crate::errors::{ErrorCode, McpError, ToolError};
use crate::managers::connection::CONNECTION_FAILED;
use crate::mcp::catalog::list_tools;
use crate::mcp::envelope::{envelope_text, text_envelope, to_call_tool_result};
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse, RelayRequest};
use crate::services::logger::Logger;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

pub struct McpServer {
    app: Arc<App>,
    logger: Logger,
}

impl McpServer {
    pub fn new(app: Arc<App>) -> Self {
        let logger = app.logger.child("mcp");
        Self { app, logger }
    }

    pub fn from_env() -> Result<Self, ToolError> {
        let settings = Settings::from_env()?;
        Ok(Self::new(Arc::new(App::initialize(settings)?)))
    }

    pub fn app(&self) -> &Arc<App> {
        &self.app
    }

    pub async fn handle_tool_call(&self, name: &str, args: Value) -> Value {
        self.app.tool_executor.handle_tool_call(name, args).await
    }

    /// Returns the connection-test text, never an error.
    pub async fn connection_test(&self) -> String {
        let envelope = self.handle_tool_call("test_connection", Value::Null).await;
        envelope_text(&envelope)
            .map(str::to_string)
            .unwrap_or_else(|| CONNECTION_FAILED.to_string())
    }

    pub async fn handle_request(&self, request: RelayRequest) -> Result<Value, McpError> {
        let method = request.method.unwrap_or_default();
        self.logger
            .debug("Relay request", Some(&serde_json::json!({ "method": method })));
        match method.as_str() {
            "list_tools" => Ok(list_tools()),
            "call_tool" => {
                let params = request.params.unwrap_or_default();
                let name = params.name.unwrap_or_default();
                let args = params.arguments.unwrap_or(Value::Null);
                Ok(self.handle_tool_call(&name, args).await)
            }
            "test_connection" => Ok(text_envelope(&self.connection_test().await)),
            _ => Err(McpError::UnknownMethod(method)),
        }
    }

    /// Parses a raw relay body; an empty or non-JSON body is rejected.
    pub async fn handle_body(&self, body: &[u8]) -> Result<Value, McpError> {
        let request: RelayRequest = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) if !map.is_empty() => {
                serde_json::from_value(Value::Object(map))
                    .map_err(|err| McpError::InvalidParams(err.to_string()))?
            }
            _ => return Err(McpError::MissingBody),
        };
        self.handle_request(request).await
    }

    fn handle_initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": SERVER_NAME, "version": VERSION},
        })
    }

    async fn handle_rpc(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.jsonrpc != "2.0" {
            return request.id.map(|id| {
                JsonRpcResponse::failure(
                    id,
                    ErrorCode::InvalidRequest.as_i32(),
                    "Invalid request".to_string(),
                )
            });
        }
        if request.method.starts_with("notifications/") && request.id.is_none() {
            return None;
        }
        let id = request.id?;
        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.handle_initialize()),
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::success(id, list_tools()),
            "tools/call" => {
                let name = request
                    .params
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                if name.is_empty() {
                    JsonRpcResponse::failure(
                        id,
                        ErrorCode::InvalidParams.as_i32(),
                        "Missing tool name".to_string(),
                    )
                } else {
                    let args = request
                        .params
                        .get("arguments")
                        .cloned()
                        .unwrap_or(Value::Null);
                    let envelope = self.handle_tool_call(name, args).await;
                    JsonRpcResponse::success(id, to_call_tool_result(&envelope))
                }
            }
            _ => JsonRpcResponse::failure(
                id,
                ErrorCode::MethodNotFound.as_i32(),
                "Method not found".to_string(),
            ),
        };
        Some(response)
    }

    pub async fn handle_rpc_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let parsed: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(_) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    ErrorCode::ParseError.as_i32(),
                    "Parse error".to_string(),
                ))
            }
        };
        match serde_json::from_value::<JsonRpcRequest>(parsed) {
            Ok(request) => self.handle_rpc(request).await,
            Err(_) => Some(JsonRpcResponse::failure(
                Value::Null,
                ErrorCode::InvalidRequest.as_i32(),
                "Invalid request".to_string(),
            )),
        }
    }

    pub async fn run_stdio(&self) -> Result<(), McpError> {
        let stdin = tokio::io::stdin();
        let stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin).lines();
        let mut writer = BufWriter::new(stdout);

        self.logger.info("Serving MCP over stdio", None);
        while let Some(line) = reader.next_line().await? {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(response) = self.handle_rpc_line(trimmed).await {
                let payload = serde_json::to_string(&response).unwrap_or_default();
                writer.write_all(payload.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        Ok(())
    }
}
