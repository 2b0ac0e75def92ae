use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all doc-indexer metrics
const PREFIX: &str = "doc_indexer";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Dispatch Metrics
    pub static ref DISPATCH_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_dispatch_total"), "Dispatched calls by method and outcome"),
        &["method", "outcome"]
    ).expect("Failed to create dispatch_total metric");

    pub static ref DISPATCH_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_dispatch_duration_seconds"),
            "Time spent executing a dispatched call"
        )
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["method"]
    ).expect("Failed to create dispatch_duration_seconds metric");

    pub static ref BATCH_SIZE: Histogram = Histogram::with_opts(
        HistogramOpts::new(format!("{PREFIX}_batch_size"), "Members per JSON-RPC batch")
            .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0])
    ).expect("Failed to create batch_size metric");

    pub static ref BATCH_REJECTED_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_batch_rejected_total"),
            "Batch members refused by admission control"
        ),
        &["reason"]
    ).expect("Failed to create batch_rejected_total metric");

    // Streaming Metrics
    pub static ref STREAM_ACTIVE_SESSIONS: GaugeVec = GaugeVec::new(
        Opts::new(format!("{PREFIX}_stream_active_sessions"), "Open SSE sessions"),
        &["stream"]
    ).expect("Failed to create stream_active_sessions metric");

    pub static ref STREAM_EVENTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_stream_events_total"), "Events pushed to stream subscribers"),
        &["topic"]
    ).expect("Failed to create stream_events_total metric");

    // Process Metrics
    pub static ref PROCESS_MEMORY_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_process_memory_bytes"),
        "Process memory usage in bytes"
    ).expect("Failed to create process_memory_bytes metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(DISPATCH_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(DISPATCH_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(BATCH_SIZE.clone()));
    let _ = REGISTRY.register(Box::new(BATCH_REJECTED_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(STREAM_ACTIVE_SESSIONS.clone()));
    let _ = REGISTRY.register(Box::new(STREAM_EVENTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PROCESS_MEMORY_BYTES.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record one dispatched call. `outcome` is "ok" or an error kind.
pub fn record_dispatch(method: &str, outcome: &str, duration: Duration) {
    DISPATCH_TOTAL.with_label_values(&[method, outcome]).inc();

    DISPATCH_DURATION_SECONDS
        .with_label_values(&[method])
        .observe(duration.as_secs_f64());
}

pub fn record_batch_size(size: usize) {
    BATCH_SIZE.observe(size as f64);
}

pub fn record_batch_rejection(reason: &str) {
    BATCH_REJECTED_TOTAL.with_label_values(&[reason]).inc();
}

pub fn stream_session_opened(stream: &str) {
    STREAM_ACTIVE_SESSIONS.with_label_values(&[stream]).inc();
}

pub fn stream_session_closed(stream: &str) {
    STREAM_ACTIVE_SESSIONS.with_label_values(&[stream]).dec();
}

pub fn record_stream_event(topic: &str) {
    STREAM_EVENTS_TOTAL.with_label_values(&[topic]).inc();
}

/// Update process memory usage
pub fn update_memory_usage() {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            let rss_kb = status
                .lines()
                .find(|line| line.starts_with("VmRSS:"))
                .and_then(|line| line.split_whitespace().nth(1))
                .and_then(|kb| kb.parse::<f64>().ok());
            if let Some(kb) = rss_kb {
                PROCESS_MEMORY_BYTES.set(kb * 1024.0);
            }
        }
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    update_memory_usage();

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
