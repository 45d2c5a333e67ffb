use serde_json::Value;

pub fn text_envelope(text: &str) -> Value {
    serde_json::json!({
        "content": [ { "type": "text", "text": text } ]
    })
}

pub fn error_envelope(message: &str) -> Value {
    serde_json::json!({ "error": message })
}

pub fn envelope_error(envelope: &Value) -> Option<&str> {
    envelope.get("error").and_then(Value::as_str)
}

pub fn envelope_text(envelope: &Value) -> Option<&str> {
    envelope
        .get("content")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .and_then(|item| item.get("text"))
        .and_then(Value::as_str)
}

/// JSON-RPC `tools/call` results always carry `content`; failures set `isError`.
pub fn to_call_tool_result(envelope: &Value) -> Value {
    match envelope_error(envelope) {
        Some(message) => serde_json::json!({
            "content": [ { "type": "text", "text": format!("Error: {}", message) } ],
            "isError": true,
        }),
        None => envelope.clone(),
    }
}
