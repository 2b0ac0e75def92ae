//! Service Methods
//!
//! Discovery and health reporting.

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::rpc::methods::{HEALTH_CHECK, HEALTH_LIVE, HEALTH_READY, SERVICE_INFO};
use crate::rpc::protocol::{JSONRPC_VERSION, MCP_PROTOCOL_VERSION};
use crate::rpc::registry::{MethodBuilder, MethodResult, RegisteredMethod};
use crate::rpc::{AppServices, MethodContext, MethodRegistry, RegistryError};

pub const SERVICE_DESCRIPTION: &str =
    "Document search and indexing service with REST, JSON-RPC, MCP, stdio and SSE surfaces";

/// Register service methods with the registry
pub fn register_methods(registry: &mut MethodRegistry) -> Result<(), RegistryError> {
    registry.register(service_info_method()?)?;
    registry.register(health_check_method()?)?;
    registry.register(health_ready_method()?)?;
    registry.register(health_live_method()?)?;
    Ok(())
}

// ============================================================================
// Health report
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentCheck {
    pub status: HealthStatus,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub search_backend: ComponentCheck,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub checks: HealthChecks,
}

/// Probes the search backend and summarizes the result.
pub async fn health_report(services: &AppServices) -> HealthReport {
    let kind = services.search.backend_kind().to_string();
    let search_backend = match services.search.stats().await {
        Ok(stats) => ComponentCheck {
            status: HealthStatus::Healthy,
            kind,
            documents: Some(stats.documents),
            message: None,
        },
        Err(e) => ComponentCheck {
            status: HealthStatus::Unhealthy,
            kind,
            documents: None,
            message: Some(e.to_string()),
        },
    };

    HealthReport {
        status: search_backend.status,
        version: services.version.clone(),
        timestamp: Utc::now().to_rfc3339(),
        uptime_seconds: services.uptime_seconds(),
        checks: HealthChecks { search_backend },
    }
}

// ============================================================================
// service.info
// ============================================================================

fn service_info_method() -> Result<RegisteredMethod, RegistryError> {
    MethodBuilder::new(SERVICE_INFO)
        .description("Describe the service, its protocols and its methods")
        .result_schema(json!({
            "type": "object",
            "required": ["name", "version", "protocol_version", "methods"]
        }))
        .tool()
        .build(service_info_handler)
}

async fn service_info_handler(ctx: MethodContext, _params: Value) -> MethodResult {
    let services = &ctx.services;
    Ok(json!({
        "name": services.service_name,
        "version": services.version,
        "description": SERVICE_DESCRIPTION,
        "protocol_version": JSONRPC_VERSION,
        "mcp_protocol_version": MCP_PROTOCOL_VERSION,
        "features": ["rest", "jsonrpc", "jsonrpc_batch", "mcp", "stdio", "sse"],
        "capabilities": {
            "document_indexing": true,
            "vector_search": false,
            "collection_filtering": true,
            "health_monitoring": true,
            "realtime_updates": true,
        },
        "search_backend": services.search.backend_kind(),
        "methods": ctx.registry().method_names(),
    }))
}

// ============================================================================
// health.*
// ============================================================================

fn health_check_method() -> Result<RegisteredMethod, RegistryError> {
    MethodBuilder::new(HEALTH_CHECK)
        .description("Report overall service health and per-component checks")
        .tool()
        .build(health_check_handler)
}

async fn health_check_handler(ctx: MethodContext, _params: Value) -> MethodResult {
    Ok(serde_json::to_value(health_report(&ctx.services).await)?)
}

fn health_ready_method() -> Result<RegisteredMethod, RegistryError> {
    MethodBuilder::new(HEALTH_READY)
        .description("Report whether the service can answer searches")
        .build(health_ready_handler)
}

async fn health_ready_handler(ctx: MethodContext, _params: Value) -> MethodResult {
    let report = health_report(&ctx.services).await;
    Ok(json!({
        "ready": report.status == HealthStatus::Healthy,
        "checks": report.checks,
    }))
}

fn health_live_method() -> Result<RegisteredMethod, RegistryError> {
    MethodBuilder::new(HEALTH_LIVE)
        .description("Report that the process is alive")
        .build(health_live_handler)
}

async fn health_live_handler(ctx: MethodContext, _params: Value) -> MethodResult {
    Ok(json!({
        "alive": true,
        "uptime_seconds": ctx.services.uptime_seconds(),
    }))
}
