//! Transport-independent JSON-RPC 2.0 handling.
//!
//! Decodes text or values into envelopes, routes single requests to
//! [`Dispatcher::dispatch`] and arrays to [`Dispatcher::dispatch_batch`], then
//! encodes the outcome. `None` means nothing should be written back.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::dispatcher::Dispatcher;
use super::envelope::RequestEnvelope;
use super::error::DispatchError;
use super::protocol::{decode_request, methods, JsonRpcResponse};

/// What to send back for one JSON-RPC payload.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum JsonRpcReply {
    Single(JsonRpcResponse),
    Batch(Vec<JsonRpcResponse>),
}

#[derive(Clone)]
pub struct JsonRpcEndpoint {
    dispatcher: Dispatcher,
    /// Methods reachable through this endpoint; `None` allows the whole registry.
    surface: Option<&'static [&'static str]>,
}

impl JsonRpcEndpoint {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            surface: None,
        }
    }

    /// Endpoint limited to the MCP lifecycle and tool methods.
    pub fn mcp(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            surface: Some(methods::MCP_SURFACE),
        }
    }

    pub async fn handle_text(&self, text: &str) -> Option<JsonRpcReply> {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => self.handle_value(value).await,
            Err(e) => Some(JsonRpcReply::Single(JsonRpcResponse::error(
                None,
                &DispatchError::ParseError(e.to_string()),
            ))),
        }
    }

    pub async fn handle_bytes(&self, bytes: &[u8]) -> Option<JsonRpcReply> {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => self.handle_value(value).await,
            Err(e) => Some(JsonRpcReply::Single(JsonRpcResponse::error(
                None,
                &DispatchError::ParseError(e.to_string()),
            ))),
        }
    }

    pub async fn handle_value(&self, value: Value) -> Option<JsonRpcReply> {
        match value {
            Value::Array(items) => self.handle_batch(items).await,
            single => self.handle_single(single).await.map(JsonRpcReply::Single),
        }
    }

    pub async fn handle_single(&self, value: Value) -> Option<JsonRpcResponse> {
        let envelope = match decode_request(value) {
            Ok(envelope) => envelope,
            Err((id, err)) => return Some(JsonRpcResponse::error(id, &err)),
        };
        if let Err(err) = self.check_surface(&envelope) {
            return envelope
                .id
                .map(|id| JsonRpcResponse::error(Some(id), &err));
        }

        let notification = envelope.is_notification();
        let response = self.dispatcher.dispatch(envelope).await;
        if notification {
            debug!("Notification handled, no response sent");
            return None;
        }
        Some(response.into())
    }

    /// An empty batch is itself an invalid request. Members that fail to
    /// decode are answered with a null id.
    pub async fn handle_batch(&self, items: Vec<Value>) -> Option<JsonRpcReply> {
        if items.is_empty() {
            return Some(JsonRpcReply::Single(JsonRpcResponse::error(
                None,
                &DispatchError::InvalidRequest("batch must not be empty".to_string()),
            )));
        }

        let mut responses = Vec::new();
        let mut envelopes = Vec::with_capacity(items.len());
        for item in items {
            match decode_request(item) {
                Ok(envelope) => match self.check_surface(&envelope) {
                    Ok(()) => envelopes.push(envelope),
                    Err(err) => {
                        if let Some(id) = envelope.id {
                            responses.push(JsonRpcResponse::error(Some(id), &err));
                        }
                    }
                },
                Err((id, err)) => responses.push(JsonRpcResponse::error(id, &err)),
            }
        }

        responses.extend(
            self.dispatcher
                .dispatch_batch(envelopes)
                .await
                .into_iter()
                .map(JsonRpcResponse::from),
        );

        if responses.is_empty() {
            None
        } else {
            Some(JsonRpcReply::Batch(responses))
        }
    }

    fn check_surface(&self, envelope: &RequestEnvelope) -> Result<(), DispatchError> {
        match self.surface {
            Some(allowed) if !allowed.contains(&envelope.method.as_str()) => {
                Err(DispatchError::MethodNotFound(envelope.method.clone()))
            }
            _ => Ok(()),
        }
    }
}
