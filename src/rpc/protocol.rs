//! JSON-RPC 2.0 and MCP wire types.
//!
//! These structures only exist at the decode/encode boundary. Everything past
//! [`decode_request`] works on [`RequestEnvelope`] / [`ResponseEnvelope`].

use super::envelope::{RequestEnvelope, ResponseEnvelope};
use super::error::DispatchError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC version string
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol version we support
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

// ============================================================================
// Core Message Types
// ============================================================================

/// Request ID can be string or any JSON number, echoed back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    Number(serde_json::Number),
    String(String),
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId::Number(id.into())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::String(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Incoming request. `jsonrpc` is optional on input; when present it must be "2.0".
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub id: Option<RequestId>,
}

/// Outgoing response. `id` is always serialized, as `null` when unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorObject>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<RequestId>, error: &DispatchError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error.into()),
        }
    }
}

impl From<ResponseEnvelope> for JsonRpcResponse {
    fn from(envelope: ResponseEnvelope) -> Self {
        match envelope.outcome {
            Ok(result) => JsonRpcResponse::success(envelope.id, result),
            Err(err) => JsonRpcResponse::error(envelope.id, &err),
        }
    }
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<&DispatchError> for JsonRpcErrorObject {
    fn from(err: &DispatchError) -> Self {
        JsonRpcErrorObject {
            code: err.code(),
            message: err.to_string(),
            data: err.data(),
        }
    }
}

/// Decodes one JSON-RPC request object.
///
/// On failure returns the id to answer with (`None` unless the object was
/// decodable) alongside the error.
pub fn decode_request(value: Value) -> Result<RequestEnvelope, (Option<RequestId>, DispatchError)> {
    if !value.is_object() {
        return Err((
            None,
            DispatchError::ParseError("request must be a JSON object".to_string()),
        ));
    }

    let request: JsonRpcRequest = serde_json::from_value(value)
        .map_err(|e| (None, DispatchError::ParseError(e.to_string())))?;

    if request.method.trim().is_empty() {
        return Err((
            None,
            DispatchError::ParseError("method must not be empty".to_string()),
        ));
    }

    if let Some(version) = &request.jsonrpc {
        if version != JSONRPC_VERSION {
            return Err((
                request.id,
                DispatchError::InvalidRequest(format!(
                    "unsupported jsonrpc version '{}'",
                    version
                )),
            ));
        }
    }

    let params = match request.params {
        None | Some(Value::Null) => Value::Object(Default::default()),
        Some(params) => params,
    };

    Ok(RequestEnvelope {
        method: request.method,
        params,
        id: request.id,
    })
}

// ============================================================================
// Method Names
// ============================================================================

pub mod methods {
    // Service
    pub const SERVICE_INFO: &str = "service.info";
    pub const HEALTH_CHECK: &str = "health.check";
    pub const HEALTH_READY: &str = "health.ready";
    pub const HEALTH_LIVE: &str = "health.live";

    // Documents
    pub const DOCUMENT_SEARCH: &str = "document.search";
    pub const DOCUMENT_GET: &str = "document.get";
    pub const DOCUMENT_INDEX: &str = "document.index";
    pub const DOCUMENT_DELETE: &str = "document.delete";
    pub const COLLECTION_LIST: &str = "collection.list";
    pub const INDEX_REBUILD: &str = "index.rebuild";

    // MCP lifecycle
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const PING: &str = "ping";

    // Tools
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";

    /// Methods answered on the MCP endpoint.
    pub const MCP_SURFACE: &[&str] = &[INITIALIZE, INITIALIZED, PING, TOOLS_LIST, TOOLS_CALL];
}

// ============================================================================
// Initialize Messages
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: ToolsCapability,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    pub list_changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

// ============================================================================
// Tools Messages
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsListResult {
    pub tools: Vec<ToolDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolsCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}
