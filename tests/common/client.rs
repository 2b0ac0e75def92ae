//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for every surface of the server.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn post_raw(&self, path: &str, body: &str) -> Response {
        self.client
            .post(self.url(path))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("POST request failed")
    }

    // ========================================================================
    // REST
    // ========================================================================

    pub async fn info(&self) -> Response {
        self.get("/info").await
    }

    pub async fn health(&self) -> Response {
        self.get("/health").await
    }

    /// POST /api/search with a top-level `collection` field
    pub async fn rest_search(&self, query: &str, collection: Option<&str>) -> Response {
        let mut body = json!({ "query": query });
        if let Some(collection) = collection {
            body["collection"] = json!(collection);
        }
        self.post_json("/api/search", &body).await
    }

    pub async fn get_document(&self, id: &str) -> Response {
        self.get(&format!("/api/docs/{}", id)).await
    }

    pub async fn index_document(&self, document: &Value) -> Response {
        self.post_json("/api/docs", document).await
    }

    pub async fn delete_document(&self, id: &str) -> Response {
        self.client
            .delete(self.url(&format!("/api/docs/{}", id)))
            .send()
            .await
            .expect("DELETE request failed")
    }

    pub async fn reindex(&self) -> Response {
        self.post_json("/api/reindex", &json!({})).await
    }

    // ========================================================================
    // JSON-RPC
    // ========================================================================

    pub async fn jsonrpc(&self, body: &Value) -> Response {
        self.post_json("/jsonrpc", body).await
    }

    /// Sends one call and returns the decoded envelope
    pub async fn rpc_call(&self, id: i64, method: &str, params: Value) -> Value {
        let response = self
            .jsonrpc(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            }))
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("Invalid JSON-RPC envelope")
    }

    pub async fn jsonrpc_batch(&self, body: &Value) -> Response {
        self.post_json("/jsonrpc/batch", body).await
    }

    // ========================================================================
    // MCP
    // ========================================================================

    pub async fn mcp(&self, id: i64, method: &str, params: Value) -> Value {
        let response = self
            .post_json(
                "/mcp",
                &json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "method": method,
                    "params": params,
                }),
            )
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("Invalid MCP envelope")
    }

    pub async fn tools_call(&self, id: i64, name: &str, arguments: Value) -> Value {
        self.mcp(id, "tools/call", json!({ "name": name, "arguments": arguments }))
            .await
    }

    // ========================================================================
    // SSE
    // ========================================================================

    pub async fn open_stream(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .header("accept", "text/event-stream")
            .send()
            .await
            .expect("Stream request failed")
    }
}

/// Reads SSE chunks until `count` `data:` events arrived and returns their
/// JSON payloads.
pub async fn read_events(response: &mut Response, count: usize) -> Vec<Value> {
    let mut buffer = String::new();
    let mut events = Vec::new();
    let deadline = Duration::from_millis(STREAM_EVENT_TIMEOUT_MS);

    while events.len() < count {
        let chunk = tokio::time::timeout(deadline, response.chunk())
            .await
            .expect("Timed out waiting for stream event")
            .expect("Stream read failed")
            .expect("Stream ended early");
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(end) = buffer.find("\n\n") {
            let frame: String = buffer.drain(..end + 2).collect();
            for line in frame.lines() {
                if let Some(data) = line.strip_prefix("data:") {
                    events.push(serde_json::from_str(data.trim()).expect("Malformed event"));
                }
            }
        }
    }

    events.truncate(count);
    events
}
