use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /mcp-endpoint`.
#[derive(Debug, Deserialize)]
pub struct RelayRequest {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<CallParams>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallParams {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError { code, message }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_request_parses_call_tool() {
        let raw = r#"{"method":"call_tool","params":{"name":"list_datasets","arguments":{"workspace_id":"A1"}}}"#;
        let parsed: RelayRequest = serde_json::from_str(raw).expect("must parse");
        assert_eq!(parsed.method.as_deref(), Some("call_tool"));
        let params = parsed.params.expect("params");
        assert_eq!(params.name.as_deref(), Some("list_datasets"));
        assert_eq!(params.arguments.expect("arguments")["workspace_id"], "A1");
    }

    #[test]
    fn relay_request_tolerates_missing_params() {
        let parsed: RelayRequest =
            serde_json::from_str(r#"{"method":"list_tools"}"#).expect("must parse");
        assert!(parsed.params.is_none());
    }

    #[test]
    fn json_rpc_request_allows_missing_id_for_notifications() {
        let raw = r#"{"jsonrpc":"2.0","method":"notifications/initialized","params":{}}"#;
        let parsed: JsonRpcRequest = serde_json::from_str(raw).expect("must parse");
        assert!(parsed.id.is_none());
        assert_eq!(parsed.method, "notifications/initialized");
    }
}
