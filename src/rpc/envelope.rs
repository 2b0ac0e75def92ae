//! Protocol-neutral call and outcome.

use super::error::DispatchError;
use super::protocol::RequestId;
use serde_json::Value;

/// One decoded call, whatever surface it arrived on.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub method: String,
    pub params: Value,
    /// `None` marks a notification: it runs, but nobody hears back.
    pub id: Option<RequestId>,
}

impl RequestEnvelope {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
            id: None,
        }
    }

    pub fn with_id(mut self, id: RequestId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Outcome of one call. Holding a `Result` keeps result and error exclusive.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    pub id: Option<RequestId>,
    pub outcome: Result<Value, DispatchError>,
}

impl ResponseEnvelope {
    pub fn success(id: Option<RequestId>, result: Value) -> Self {
        Self {
            id,
            outcome: Ok(result),
        }
    }

    pub fn failure(id: Option<RequestId>, error: DispatchError) -> Self {
        Self {
            id,
            outcome: Err(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    pub fn result(&self) -> Option<&Value> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&DispatchError> {
        self.outcome.as_ref().err()
    }
}
