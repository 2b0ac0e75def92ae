//! Tool and MCP lifecycle methods.
//!
//! `tools/call` rewrites `{name, arguments}` into a call of the named method
//! and dispatches it, so a tool answers exactly what the method answers.

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::rpc::methods::{INITIALIZE, INITIALIZED, PING, TOOLS_CALL, TOOLS_LIST};
use crate::rpc::protocol::{
    InitializeResult, ServerCapabilities, ServerInfo, ToolsCallParams, ToolsCapability,
    ToolsListResult, MCP_PROTOCOL_VERSION,
};
use crate::rpc::registry::{MethodBuilder, MethodResult, RegisteredMethod};
use crate::rpc::{DispatchError, MethodContext, MethodRegistry, RegistryError};

/// Register tool and lifecycle methods with the registry
pub fn register_methods(registry: &mut MethodRegistry) -> Result<(), RegistryError> {
    registry.register(tools_list_method()?)?;
    registry.register(tools_call_method()?)?;
    registry.register(initialize_method()?)?;
    registry.register(initialized_method()?)?;
    registry.register(ping_method()?)?;
    Ok(())
}

fn tools_list_method() -> Result<RegisteredMethod, RegistryError> {
    MethodBuilder::new(TOOLS_LIST)
        .description("List the methods callable as tools")
        .build(tools_list_handler)
}

async fn tools_list_handler(ctx: MethodContext, _params: Value) -> MethodResult {
    let result = ToolsListResult {
        tools: ctx.registry().tools(),
    };
    Ok(serde_json::to_value(result)?)
}

fn tools_call_method() -> Result<RegisteredMethod, RegistryError> {
    MethodBuilder::new(TOOLS_CALL)
        .description("Invoke a tool by name with the given arguments")
        .params_schema(json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "minLength": 1},
                "arguments": {"type": ["object", "null"]}
            },
            "required": ["name"]
        }))
        .build(tools_call_handler)
}

async fn tools_call_handler(ctx: MethodContext, params: Value) -> MethodResult {
    let params: ToolsCallParams = serde_json::from_value(params)
        .map_err(|e| DispatchError::invalid_params("params", e.to_string()))?;
    let arguments = match params.arguments {
        None | Some(Value::Null) => json!({}),
        Some(arguments) => arguments,
    };
    debug!("tools/call -> {}", params.name);
    ctx.dispatcher.call_tool(&params.name, arguments).await
}

fn initialize_method() -> Result<RegisteredMethod, RegistryError> {
    MethodBuilder::new(INITIALIZE)
        .description("MCP handshake")
        .build(initialize_handler)
}

async fn initialize_handler(ctx: MethodContext, params: Value) -> MethodResult {
    if let Some(client) = params.get("clientInfo") {
        info!(
            "MCP client connected: {} {}",
            client["name"].as_str().unwrap_or("unknown"),
            client["version"].as_str().unwrap_or("")
        );
    }
    let result = InitializeResult {
        protocol_version: MCP_PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: ToolsCapability {
                list_changed: false,
            },
        },
        server_info: ServerInfo {
            name: ctx.services.service_name.clone(),
            version: ctx.services.version.clone(),
        },
    };
    Ok(serde_json::to_value(result)?)
}

fn initialized_method() -> Result<RegisteredMethod, RegistryError> {
    MethodBuilder::new(INITIALIZED)
        .description("MCP client finished initialization")
        .build(|_ctx, _params| async move {
            debug!("MCP client initialized");
            Ok(Value::Null)
        })
}

fn ping_method() -> Result<RegisteredMethod, RegistryError> {
    MethodBuilder::new(PING)
        .description("Liveness round trip")
        .build(|_ctx, _params| async move { Ok(json!({})) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::methods::{DOCUMENT_SEARCH, SERVICE_INFO};
    use crate::rpc::{ErrorKind, RequestEnvelope};
    use crate::testing::seeded_dispatcher;

    #[tokio::test]
    async fn test_tools_list_excludes_meta_methods() {
        let result = seeded_dispatcher()
            .dispatch(RequestEnvelope::new(TOOLS_LIST, json!({})))
            .await
            .outcome
            .unwrap();
        let names: Vec<_> = result["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert!(names.contains(&DOCUMENT_SEARCH.to_string()));
        assert!(names.contains(&SERVICE_INFO.to_string()));
        assert!(!names.contains(&TOOLS_LIST.to_string()));
        assert!(!names.contains(&TOOLS_CALL.to_string()));
        assert!(!names.contains(&PING.to_string()));
        assert!(result["tools"][0]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn test_tools_call_matches_direct_dispatch() {
        let dispatcher = seeded_dispatcher();
        let arguments = json!({"query": "search", "filters": {"collection": "docs-b"}});

        let mut direct = dispatcher
            .dispatch(RequestEnvelope::new(DOCUMENT_SEARCH, arguments.clone()))
            .await
            .outcome
            .unwrap();
        let mut via_tool = dispatcher
            .dispatch(RequestEnvelope::new(
                TOOLS_CALL,
                json!({"name": DOCUMENT_SEARCH, "arguments": arguments}),
            ))
            .await
            .outcome
            .unwrap();

        direct["search_metadata"]["took_ms"] = json!(0);
        via_tool["search_metadata"]["took_ms"] = json!(0);
        assert_eq!(direct, via_tool);
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool() {
        let response = seeded_dispatcher()
            .dispatch(RequestEnvelope::new(
                TOOLS_CALL,
                json!({"name": "no.such.tool"}),
            ))
            .await;
        assert_eq!(response.error().unwrap().kind(), ErrorKind::MethodNotFound);
    }

    #[tokio::test]
    async fn test_tools_call_cannot_reach_non_tool_methods() {
        let response = seeded_dispatcher()
            .dispatch(RequestEnvelope::new(TOOLS_CALL, json!({"name": TOOLS_LIST})))
            .await;
        assert_eq!(response.error().unwrap().code(), -32601);
    }

    #[tokio::test]
    async fn test_tools_call_missing_name() {
        let response = seeded_dispatcher()
            .dispatch(RequestEnvelope::new(TOOLS_CALL, json!({"arguments": {}})))
            .await;
        assert_eq!(response.error().unwrap().kind(), ErrorKind::InvalidParams);
    }

    #[tokio::test]
    async fn test_initialize_and_ping() {
        let dispatcher = seeded_dispatcher();
        let init = dispatcher
            .dispatch(RequestEnvelope::new(
                INITIALIZE,
                json!({"protocolVersion": "2024-11-05", "clientInfo": {"name": "t", "version": "1"}}),
            ))
            .await
            .outcome
            .unwrap();
        assert_eq!(init["protocolVersion"], MCP_PROTOCOL_VERSION);
        assert_eq!(init["serverInfo"]["name"], "doc-indexer-test");
        assert!(init["capabilities"]["tools"].is_object());

        let pong = dispatcher
            .dispatch(RequestEnvelope::new(PING, json!({})))
            .await
            .outcome
            .unwrap();
        assert_eq!(pong, json!({}));
    }
}
