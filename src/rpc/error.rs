//! Protocol-neutral failure taxonomy for dispatched calls.

use crate::search::BackendError;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    NotFound,
    BackendUnavailable,
    Timeout,
    InternalError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ParseError => "parse_error",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::MethodNotFound => "method_not_found",
            ErrorKind::InvalidParams => "invalid_params",
            ErrorKind::NotFound => "not_found",
            ErrorKind::BackendUnavailable => "backend_unavailable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::InternalError => "internal_error",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DispatchError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {field}: {message}")]
    InvalidParams { field: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Timed out: {operation} exceeded {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    pub fn invalid_params(field: impl Into<String>, message: impl Into<String>) -> Self {
        DispatchError::InvalidParams {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::ParseError(_) => ErrorKind::ParseError,
            DispatchError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            DispatchError::MethodNotFound(_) => ErrorKind::MethodNotFound,
            DispatchError::InvalidParams { .. } => ErrorKind::InvalidParams,
            DispatchError::NotFound(_) => ErrorKind::NotFound,
            DispatchError::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            DispatchError::Timeout { .. } => ErrorKind::Timeout,
            DispatchError::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// JSON-RPC error code.
    pub fn code(&self) -> i32 {
        match self.kind() {
            ErrorKind::ParseError => -32700,
            ErrorKind::InvalidRequest => -32600,
            ErrorKind::MethodNotFound => -32601,
            ErrorKind::InvalidParams => -32602,
            ErrorKind::NotFound => -32004,
            ErrorKind::BackendUnavailable => -32003,
            ErrorKind::Timeout => -32002,
            ErrorKind::InternalError => -32603,
        }
    }

    /// Structured detail attached to the error object, if any.
    pub fn data(&self) -> Option<Value> {
        match self {
            DispatchError::MethodNotFound(method) => Some(json!({ "method": method })),
            DispatchError::InvalidParams { field, message } => {
                Some(json!({ "field": field, "details": message }))
            }
            DispatchError::Timeout {
                operation,
                timeout_ms,
            } => Some(json!({ "operation": operation, "timeout_ms": timeout_ms })),
            _ => None,
        }
    }
}

impl From<BackendError> for DispatchError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Unavailable(msg) => DispatchError::BackendUnavailable(msg),
            BackendError::Timeout {
                operation,
                timeout_ms,
            } => DispatchError::Timeout {
                operation,
                timeout_ms,
            },
            BackendError::NotFound(id) => DispatchError::NotFound(id),
            BackendError::InvalidDocument(msg) => DispatchError::invalid_params("document", msg),
            BackendError::Internal(msg) => DispatchError::Internal(msg),
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        DispatchError::Internal(format!("failed to encode result: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_taxonomy() {
        let cases = [
            (DispatchError::ParseError(String::new()), -32700),
            (DispatchError::InvalidRequest(String::new()), -32600),
            (DispatchError::MethodNotFound(String::new()), -32601),
            (DispatchError::invalid_params("query", "missing"), -32602),
            (DispatchError::NotFound(String::new()), -32004),
            (DispatchError::BackendUnavailable(String::new()), -32003),
            (
                DispatchError::Timeout {
                    operation: "search".to_string(),
                    timeout_ms: 1,
                },
                -32002,
            ),
            (DispatchError::Internal(String::new()), -32603),
        ];
        for (err, code) in cases {
            assert_eq!(err.code(), code, "{:?}", err);
        }
    }

    #[test]
    fn test_invalid_params_names_field() {
        let err = DispatchError::invalid_params("limit", "must be at least 1");
        assert_eq!(err.to_string(), "Invalid params: limit: must be at least 1");
        assert_eq!(err.data().unwrap()["field"], "limit");
    }

    #[test]
    fn test_backend_errors_map_to_kinds() {
        assert_eq!(
            DispatchError::from(BackendError::Unavailable("down".to_string())).kind(),
            ErrorKind::BackendUnavailable
        );
        assert_eq!(
            DispatchError::from(BackendError::Timeout {
                operation: "search".to_string(),
                timeout_ms: 5
            })
            .kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            DispatchError::from(BackendError::Internal("boom".to_string())).kind(),
            ErrorKind::InternalError
        );
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(ErrorKind::BackendUnavailable).unwrap(),
            "backend_unavailable"
        );
        assert_eq!(ErrorKind::MethodNotFound.as_str(), "method_not_found");
    }
}
