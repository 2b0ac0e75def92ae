use anyhow::{Context, Result};
use std::any::Any;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{error, info};

use super::jsonrpc::make_jsonrpc_routes;
use super::rest::make_rest_routes;
use super::stream::make_stream_routes;
use super::{log_requests, metrics, state::ServerState, ServerConfig};
use crate::rpc::Dispatcher;

#[derive(Serialize)]
struct ServerStats {
    pub service: String,
    pub version: String,
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let services = state.dispatcher.services();
    Json(ServerStats {
        service: services.service_name.clone(),
        version: services.version.clone(),
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    })
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Request handler panicked: {}", details);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": {
                "kind": "internal_error",
                "message": "Internal server error",
            }
        })),
    )
        .into_response()
}

pub fn make_app(state: ServerState) -> Router {
    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    home_router
        .merge(make_rest_routes(state.clone()))
        .merge(make_jsonrpc_routes(state.clone()))
        .merge(make_stream_routes(state.clone()))
        .layer(middleware::from_fn_with_state(state, log_requests))
        .layer(CatchPanicLayer::custom(handle_panic))
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics::metrics_handler))
}

async fn shutdown_signal(token: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            info!("Received Ctrl+C, initiating graceful shutdown");
            token.cancel();
        }
        _ = token.cancelled() => {}
    }
}

pub async fn run_server(config: ServerConfig, dispatcher: Dispatcher, hash: String) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(ServerState::new(config, dispatcher, hash));

    let listener = TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    let shutdown = CancellationToken::new();

    let metrics_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let served = axum::serve(metrics_listener, make_metrics_app())
            .with_graceful_shutdown(metrics_shutdown.cancelled_owned())
            .await;
        if let Err(e) = served {
            error!("Metrics server failed: {}", e);
        }
    });

    let memory_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            tokio::select! {
                _ = memory_shutdown.cancelled() => break,
                _ = interval.tick() => metrics::update_memory_usage(),
            }
        }
    });

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await;
    shutdown.cancel();
    Ok(served?)
}
