//! JSON-RPC over HTTP
//!
//! Always 200 with an envelope, or 204 when every call was a notification.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::Value;

use super::state::{McpEndpoint, ServerState};
use crate::rpc::{DispatchError, JsonRpcEndpoint, JsonRpcReply, JsonRpcResponse};

pub fn reply_response(reply: Option<JsonRpcReply>) -> Response {
    match reply {
        Some(reply) => (StatusCode::OK, Json(reply)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn jsonrpc(State(endpoint): State<JsonRpcEndpoint>, body: Bytes) -> Response {
    reply_response(endpoint.handle_bytes(&body).await)
}

/// Same as `/jsonrpc` but the body must be an array.
async fn jsonrpc_batch(State(endpoint): State<JsonRpcEndpoint>, body: Bytes) -> Response {
    let reply = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Array(items)) => endpoint.handle_batch(items).await,
        Ok(_) => Some(JsonRpcReply::Batch(vec![JsonRpcResponse::error(
            None,
            &DispatchError::InvalidRequest("batch endpoint expects a JSON array".to_string()),
        )])),
        Err(e) => Some(JsonRpcReply::Single(JsonRpcResponse::error(
            None,
            &DispatchError::ParseError(e.to_string()),
        ))),
    };
    reply_response(reply)
}

async fn mcp(State(McpEndpoint(endpoint)): State<McpEndpoint>, body: Bytes) -> Response {
    reply_response(endpoint.handle_bytes(&body).await)
}

pub fn make_jsonrpc_routes(state: ServerState) -> Router {
    Router::new()
        .route("/jsonrpc", post(jsonrpc))
        .route("/jsonrpc/batch", post(jsonrpc_batch))
        .route("/mcp", post(mcp))
        .with_state(state)
}
