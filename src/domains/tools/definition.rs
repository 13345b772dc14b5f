//! Tool definitions and argument validation.
//!
//! A [`ToolDefinition`] carries the JSON Schema generated from a tool's typed
//! parameter struct. The same schema is advertised by `tools/list` and used to
//! check incoming arguments before any handler runs.

use std::sync::Arc;

use rmcp::{
    handler::server::tool::cached_schema_for_type,
    model::{JsonObject, Tool},
};
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use super::ToolError;

/// Immutable description of one tool.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Arc<JsonObject>,
}

impl ToolDefinition {
    /// Build a definition whose schema is derived from `P`.
    pub fn for_params<P: JsonSchema + 'static>(
        name: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            description,
            input_schema: cached_schema_for_type::<P>(),
        }
    }

    /// Field names listed under `required`.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }

    /// Check required-field presence and primitive types.
    ///
    /// Fields not declared in the schema are ignored.
    pub fn validate(&self, arguments: &JsonObject) -> Result<(), ToolError> {
        for field in self.required_fields() {
            match arguments.get(field) {
                None | Some(Value::Null) => {
                    return Err(ToolError::invalid_arguments(
                        self.name,
                        format!("missing required field '{field}'"),
                    ));
                }
                Some(_) => {}
            }
        }

        let Some(properties) = self.input_schema.get("properties").and_then(Value::as_object)
        else {
            return Ok(());
        };

        for (field, value) in arguments {
            let Some(property) = properties.get(field) else {
                continue;
            };
            if value.is_null() && is_nullable(property) {
                continue;
            }
            let allowed = declared_types(property);
            if allowed.is_empty() {
                continue;
            }
            if !allowed.iter().any(|ty| matches_type(ty, value)) {
                return Err(ToolError::invalid_arguments(
                    self.name,
                    format!(
                        "field '{field}' must be of type {}, got {}",
                        allowed.join(" or "),
                        type_name(value)
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Convert into the rmcp tool model used by the stdio transport.
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.into(),
            description: Some(self.description.into()),
            input_schema: self.input_schema.clone(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }
}

/// The `type` keyword of a property schema, as a list.
fn declared_types(property: &Value) -> Vec<&str> {
    match property.get("type") {
        Some(Value::String(ty)) => vec![ty.as_str()],
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Nullable either through the OpenAPI-style keyword or a `"null"` type entry.
fn is_nullable(property: &Value) -> bool {
    property.get("nullable").and_then(Value::as_bool) == Some(true)
        || declared_types(property).contains(&"null")
}

fn matches_type(ty: &str, value: &Value) -> bool {
    match ty {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => {
            value.is_i64()
                || value.is_u64()
                || value.as_f64().is_some_and(|n| n.is_finite() && n.fract() == 0.0)
        }
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
