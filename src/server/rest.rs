//! REST routes
//!
//! Each path maps onto one fixed method; bodies and path segments become the
//! method params and the result is returned as-is.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use super::state::ServerState;
use crate::rpc::{methods, DispatchError, Dispatcher, ErrorKind, RequestEnvelope};

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ParseError | ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::MethodNotFound | ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidParams => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::BackendUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let mut error = json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        if let Some(data) = self.data() {
            error["data"] = data;
        }
        (status_for(self.kind()), Json(json!({ "error": error }))).into_response()
    }
}

type RestResult = Result<Response, DispatchError>;

async fn call(dispatcher: &Dispatcher, method: &str, params: Value) -> Result<Value, DispatchError> {
    dispatcher
        .dispatch(RequestEnvelope::new(method, params))
        .await
        .outcome
}

/// An empty body counts as `{}`.
fn parse_body(body: &Bytes) -> Result<Value, DispatchError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    let value: Value =
        serde_json::from_slice(body).map_err(|e| DispatchError::ParseError(e.to_string()))?;
    if !value.is_object() {
        return Err(DispatchError::InvalidRequest(
            "request body must be a JSON object".to_string(),
        ));
    }
    Ok(value)
}

async fn info(State(state): State<ServerState>) -> RestResult {
    let info = call(&state.dispatcher, methods::SERVICE_INFO, json!({})).await?;
    Ok(Json(info).into_response())
}

async fn health(State(state): State<ServerState>) -> RestResult {
    let health = call(&state.dispatcher, methods::HEALTH_CHECK, json!({})).await?;
    let status = if health["status"] == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok((status, Json(health)).into_response())
}

async fn health_ready(State(state): State<ServerState>) -> RestResult {
    let ready = call(&state.dispatcher, methods::HEALTH_READY, json!({})).await?;
    let status = if ready["ready"] == true {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok((status, Json(ready)).into_response())
}

async fn health_live(State(state): State<ServerState>) -> RestResult {
    let live = call(&state.dispatcher, methods::HEALTH_LIVE, json!({})).await?;
    Ok(Json(live).into_response())
}

async fn search(State(state): State<ServerState>, body: Bytes) -> RestResult {
    let params = parse_body(&body)?;
    let results = call(&state.dispatcher, methods::DOCUMENT_SEARCH, params).await?;
    Ok(Json(results).into_response())
}

async fn reindex(State(state): State<ServerState>) -> RestResult {
    let result = call(&state.dispatcher, methods::INDEX_REBUILD, json!({})).await?;
    Ok(Json(result).into_response())
}

async fn get_document(State(state): State<ServerState>, Path(id): Path<String>) -> RestResult {
    let document = call(&state.dispatcher, methods::DOCUMENT_GET, json!({ "id": id })).await?;
    Ok(Json(document).into_response())
}

async fn delete_document(State(state): State<ServerState>, Path(id): Path<String>) -> RestResult {
    let result = call(&state.dispatcher, methods::DOCUMENT_DELETE, json!({ "id": id })).await?;
    Ok(Json(result).into_response())
}

async fn index_document(State(state): State<ServerState>, body: Bytes) -> RestResult {
    let params = parse_body(&body)?;
    let result = call(&state.dispatcher, methods::DOCUMENT_INDEX, params).await?;
    Ok((StatusCode::CREATED, Json(result)).into_response())
}

async fn collections(State(state): State<ServerState>) -> RestResult {
    let result = call(&state.dispatcher, methods::COLLECTION_LIST, json!({})).await?;
    Ok(Json(result).into_response())
}

async fn status(State(state): State<ServerState>) -> RestResult {
    let health = call(&state.dispatcher, methods::HEALTH_CHECK, json!({})).await?;
    let collections = call(&state.dispatcher, methods::COLLECTION_LIST, json!({})).await?;
    let registry = state.dispatcher.registry();
    Ok(Json(json!({
        "status": health["status"],
        "version": health["version"],
        "hash": state.hash,
        "uptime_seconds": health["uptime_seconds"],
        "search_backend": health["checks"]["search_backend"],
        "collections": collections["collections"],
        "methods": registry.len(),
        "tools": registry.tool_count(),
        "dispatch": {
            "max_in_flight": state.dispatcher.settings().max_in_flight,
            "max_queue_depth": state.dispatcher.settings().max_queue_depth,
        },
    }))
    .into_response())
}

pub fn make_rest_routes(state: ServerState) -> Router {
    Router::new()
        .route("/info", get(info))
        .route("/health", get(health))
        .route("/health/ready", get(health_ready))
        .route("/health/live", get(health_live))
        .route("/api/search", post(search))
        .route("/documents/search", post(search))
        .route("/api/reindex", post(reindex))
        .route("/api/docs", post(index_document))
        .route("/api/docs/{id}", get(get_document).delete(delete_document))
        .route("/api/collections", get(collections))
        .route("/api/status", get(status))
        .with_state(state)
}
