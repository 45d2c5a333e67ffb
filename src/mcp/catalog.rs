use crate::errors::{ToolError, ToolErrorKind};
use jsonschema::error::ValidationErrorKind;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDef {
    pub fn required_fields(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

static TOOL_CATALOG: Lazy<Vec<ToolDef>> = Lazy::new(|| {
    let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tool_catalog.json"));
    serde_json::from_str(raw).expect("tool_catalog.json must be valid JSON")
});

static TOOL_MAP: Lazy<HashMap<String, ToolDef>> = Lazy::new(|| {
    TOOL_CATALOG
        .iter()
        .cloned()
        .map(|tool| (tool.name.clone(), tool))
        .collect()
});

static TOOL_VALIDATORS: Lazy<HashMap<String, JSONSchema>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for tool in TOOL_CATALOG.iter() {
        if let Ok(schema) = JSONSchema::compile(&tool.input_schema) {
            map.insert(tool.name.clone(), schema);
        }
    }
    map
});

pub fn tool_catalog() -> &'static Vec<ToolDef> {
    &TOOL_CATALOG
}

pub fn tool_by_name(name: &str) -> Option<&'static ToolDef> {
    TOOL_MAP.get(name)
}

pub fn list_tools() -> Value {
    serde_json::json!({ "tools": tool_catalog() })
}

/// Absent and empty required strings are both reported as missing, in the
/// order the catalog declares them.
pub fn validate_tool_args(tool_name: &str, args: &Value) -> Result<(), ToolError> {
    let (Some(tool), Some(schema)) = (tool_by_name(tool_name), TOOL_VALIDATORS.get(tool_name))
    else {
        return Ok(());
    };
    let Err(errors) = schema.validate(args) else {
        return Ok(());
    };

    let mut missing: Vec<String> = Vec::new();
    let mut problems = Vec::new();
    for err in errors {
        let instance_path = err.instance_path.to_string();
        match &err.kind {
            ValidationErrorKind::Required { property } => {
                missing.push(
                    property
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| property.to_string()),
                );
            }
            ValidationErrorKind::MinLength { .. } => {
                missing.push(instance_path.trim_start_matches('/').to_string());
            }
            _ => {
                let at = if instance_path.is_empty() {
                    "(root)".to_string()
                } else {
                    instance_path
                };
                problems.push(format!("{}: {}", at, err));
            }
        }
    }

    if !missing.is_empty() {
        let order = tool.required_fields();
        missing.sort_by_key(|field| {
            order
                .iter()
                .position(|name| *name == field.as_str())
                .unwrap_or(usize::MAX)
        });
        missing.dedup();
        return Err(ToolError::validation(tool_name, &missing));
    }

    Err(ToolError::new(
        ToolErrorKind::Validation,
        "INVALID_ARGUMENT",
        format!("Invalid arguments for {}: {}", tool_name, problems.join("; ")),
    ))
}
