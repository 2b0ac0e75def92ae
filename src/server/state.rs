use axum::extract::FromRef;
use std::time::Instant;

use super::ServerConfig;
use crate::rpc::{Dispatcher, JsonRpcEndpoint};
use crate::streaming::StreamPublisher;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub dispatcher: Dispatcher,
    pub jsonrpc: JsonRpcEndpoint,
    pub mcp: McpEndpoint,
    pub publisher: StreamPublisher,
    pub hash: String,
}

/// JSON-RPC endpoint restricted to the MCP surface.
#[derive(Clone)]
pub struct McpEndpoint(pub JsonRpcEndpoint);

impl ServerState {
    pub fn new(config: ServerConfig, dispatcher: Dispatcher, hash: impl Into<String>) -> Self {
        let publisher = StreamPublisher::new(dispatcher.clone(), &config.streaming);
        ServerState {
            jsonrpc: JsonRpcEndpoint::new(dispatcher.clone()),
            mcp: McpEndpoint(JsonRpcEndpoint::mcp(dispatcher.clone())),
            publisher,
            config,
            start_time: Instant::now(),
            dispatcher,
            hash: hash.into(),
        }
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for Dispatcher {
    fn from_ref(input: &ServerState) -> Self {
        input.dispatcher.clone()
    }
}

impl FromRef<ServerState> for JsonRpcEndpoint {
    fn from_ref(input: &ServerState) -> Self {
        input.jsonrpc.clone()
    }
}

impl FromRef<ServerState> for McpEndpoint {
    fn from_ref(input: &ServerState) -> Self {
        input.mcp.clone()
    }
}

impl FromRef<ServerState> for StreamPublisher {
    fn from_ref(input: &ServerState) -> Self {
        input.publisher.clone()
    }
}
