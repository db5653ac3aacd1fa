//! JSON-RPC 2.0 message types for the Model Context Protocol.

use qualys_tools::OperationDefinition;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// MCP revision this server speaks.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Line could not be parsed as JSON.
pub const PARSE_ERROR: i32 = -32700;
/// Message is JSON but not a request.
pub const INVALID_REQUEST: i32 = -32600;
/// Method is not implemented.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Parameters do not fit the method.
pub const INVALID_PARAMS: i32 = -32602;
/// Reply could not be produced.
pub const INTERNAL_ERROR: i32 = -32603;

/// Incoming request or notification.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol marker, expected to be `"2.0"`.
    #[serde(default)]
    pub jsonrpc: String,
    /// Correlation id; `None` only when the member is absent, which marks a
    /// notification. An explicit `null` id is kept as `Some(Value::Null)`.
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
    /// Method name.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Value,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl JsonRpcRequest {
    /// Returns `true` when no reply is expected.
    #[must_use]
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Outgoing reply.
#[derive(Debug, Serialize, PartialEq)]
pub struct JsonRpcResponse {
    /// Always `"2.0"`.
    pub jsonrpc: &'static str,
    /// Id copied from the request; `null` when it could not be read.
    pub id: Value,
    /// Success payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// Protocol-level failure.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct JsonRpcError {
    /// Standard JSON-RPC code.
    pub code: i32,
    /// Human-readable message.
    pub message: String,
}

impl JsonRpcResponse {
    /// Builds a success reply.
    #[must_use]
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error reply.
    #[must_use]
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// `initialize` result.
#[derive(Debug, Serialize)]
pub struct InitializeResult {
    /// Negotiated protocol revision.
    #[serde(rename = "protocolVersion")]
    pub protocol_version: &'static str,
    /// Advertised capabilities.
    pub capabilities: ServerCapabilities,
    /// Server identification.
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

impl Default for InitializeResult {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: env!("CARGO_PKG_NAME"),
                version: env!("CARGO_PKG_VERSION"),
            },
        }
    }
}

/// Capabilities block.
#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    /// Tool support.
    pub tools: ToolsCapability,
}

/// Tool capability flags.
#[derive(Debug, Serialize)]
pub struct ToolsCapability {
    /// The tool list never changes at runtime.
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Server name and version.
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    /// Package name.
    pub name: &'static str,
    /// Package version.
    pub version: &'static str,
}

/// One entry of `tools/list`.
#[derive(Debug, Serialize)]
pub struct Tool<'a> {
    /// Operation name.
    pub name: &'a str,
    /// Operation description.
    pub description: &'a str,
    /// JSON schema of the arguments.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl<'a> From<&'a OperationDefinition> for Tool<'a> {
    fn from(definition: &'a OperationDefinition) -> Self {
        Self {
            name: definition.name(),
            description: definition.description(),
            input_schema: definition.input_schema(),
        }
    }
}

/// `tools/list` result.
#[derive(Debug, Serialize)]
pub struct ToolsListResult<'a> {
    /// Every operation, in catalog order.
    pub tools: Vec<Tool<'a>>,
}

/// `tools/call` parameters.
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    /// Operation to run.
    pub name: String,
    /// Raw arguments; bound against the definition by the dispatcher.
    #[serde(default)]
    pub arguments: Value,
}

/// `tools/call` result: a single text block.
#[derive(Debug, Serialize)]
pub struct ToolCallResult {
    /// Content blocks.
    pub content: Vec<ToolContent>,
}

impl ToolCallResult {
    /// Wraps `text` as the only content block.
    #[must_use]
    pub fn text(text: String) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text",
                text,
            }],
        }
    }
}

/// One content block.
#[derive(Debug, Serialize)]
pub struct ToolContent {
    /// Block type; always `"text"`.
    #[serde(rename = "type")]
    pub content_type: &'static str,
    /// Block text.
    pub text: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn notifications_have_no_id() {
        let request: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .unwrap();
        assert!(request.is_notification());
        assert_eq!(request.params, Value::Null);
    }

    #[test]
    fn null_id_is_still_a_request() {
        let request: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).unwrap();
        assert!(!request.is_notification());
        assert_eq!(request.id, Some(Value::Null));
    }

    #[test]
    fn error_reply_omits_result() {
        let reply = JsonRpcResponse::error(Some(json!(7)), METHOD_NOT_FOUND, "Method not found");
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "id": 7,
                "error": { "code": -32601, "message": "Method not found" }
            })
        );
    }

    #[test]
    fn call_result_is_one_text_block() {
        let result = ToolCallResult::text("Error: Unknown tool: x".into());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "content": [{ "type": "text", "text": "Error: Unknown tool: x" }] })
        );
    }
}
