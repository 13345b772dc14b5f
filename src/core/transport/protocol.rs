//! JSON-RPC 2.0 message types for the HTTP transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::session::{ClientInfo, SessionError, SessionInit};

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC request or notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Notifications carry no id and get no response body. A message with an
    /// id is a request whatever its method, and is always answered.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC response; `id` is always present, `null` when unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    pub fn parse_error() -> Self {
        Self::error(None, PARSE_ERROR, "Parse error")
    }

    /// Method not found error.
    pub fn method_not_found(id: Option<Value>, method: &str) -> Self {
        Self::error(id, METHOD_NOT_FOUND, format!("Method not found: {method}"))
    }

    /// Invalid request error.
    pub fn invalid_request(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, INVALID_REQUEST, msg)
    }

    /// Invalid params error.
    pub fn invalid_params(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, INVALID_PARAMS, msg)
    }

    /// Internal error.
    pub fn internal_error(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, INTERNAL_ERROR, msg)
    }

    /// Session-level rejection, always with a null id.
    pub fn session_error(err: &SessionError) -> Self {
        Self::error(None, err.code(), err.to_string())
    }
}

/// Session parameters of a well-formed `initialize` request.
///
/// Requires `jsonrpc:"2.0"`, a non-null id, a `protocolVersion` string, a
/// `capabilities` object and `clientInfo.name`.
pub fn parse_initialize(message: &Value) -> Option<SessionInit> {
    if message.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return None;
    }
    if message.get("method").and_then(Value::as_str) != Some("initialize") {
        return None;
    }
    if message.get("id").is_none_or(Value::is_null) {
        return None;
    }

    let params = message.get("params")?;
    let protocol_version = params.get("protocolVersion")?.as_str()?;
    params.get("capabilities")?.as_object()?;
    let client = params.get("clientInfo")?;
    let name = client.get("name")?.as_str()?;

    Some(SessionInit {
        protocol_version: protocol_version.to_string(),
        client: ClientInfo {
            name: name.to_string(),
            version: client
                .get("version")
                .and_then(Value::as_str)
                .map(str::to_string),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn initialize() -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": { "name": "agent", "version": "1.0" }
            }
        })
    }

    #[test]
    fn test_well_formed_initialize() {
        let init = parse_initialize(&initialize()).unwrap();
        assert_eq!(init.protocol_version, "2025-03-26");
        assert_eq!(init.client.name, "agent");
        assert_eq!(init.client.version.as_deref(), Some("1.0"));
    }

    #[test]
    fn test_malformed_initialize_rejected() {
        let mut no_id = initialize();
        no_id["id"] = Value::Null;
        assert!(parse_initialize(&no_id).is_none());

        let mut wrong_method = initialize();
        wrong_method["method"] = json!("tools/list");
        assert!(parse_initialize(&wrong_method).is_none());

        let mut no_caps = initialize();
        no_caps["params"].as_object_mut().unwrap().remove("capabilities");
        assert!(parse_initialize(&no_caps).is_none());

        let mut no_client = initialize();
        no_client["params"]["clientInfo"] = json!({ "version": "1" });
        assert!(parse_initialize(&no_client).is_none());

        let mut old_rpc = initialize();
        old_rpc["jsonrpc"] = json!("1.0");
        assert!(parse_initialize(&old_rpc).is_none());
    }

    #[test]
    fn test_only_id_less_messages_are_notifications() {
        let parse = |v: Value| serde_json::from_value::<JsonRpcRequest>(v).unwrap();
        assert!(parse(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" })).is_notification());
        assert!(parse(json!({ "jsonrpc": "2.0", "method": "ping" })).is_notification());
        assert!(!parse(json!({ "jsonrpc": "2.0", "id": 7, "method": "notifications/initialized" })).is_notification());
    }

    #[test]
    fn test_response_always_carries_id() {
        let wire = serde_json::to_value(JsonRpcResponse::session_error(&SessionError::NoValidSession))
            .unwrap();
        assert_eq!(
            wire,
            json!({
                "jsonrpc": "2.0",
                "error": { "code": -32000, "message": "Bad Request: No valid session ID provided" },
                "id": null
            })
        );
    }
}
