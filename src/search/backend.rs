//! Search backend trait and result types

use super::document::{CollectionStats, Document};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A resolved search request, as handed to a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub text: String,
    /// `None` searches every collection.
    pub collection: Option<String>,
    /// Minimum score in [0, 1].
    pub threshold: Option<f32>,
    pub limit: usize,
    /// Return the whole document body instead of a snippet.
    pub include_content: bool,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, limit: usize) -> Self {
        Self {
            text: text.into(),
            collection: None,
            threshold: None,
            limit,
            include_content: false,
        }
    }

    pub fn in_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub score: f32,
    pub title: String,
    /// Snippet around the first matching term, or the full body.
    pub content: String,
    pub section: Option<String>,
    pub source_collection: String,
    pub doc_type: String,
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendStats {
    pub kind: String,
    pub documents: usize,
    pub collections: usize,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    #[error("Search backend unavailable: {0}")]
    Unavailable(String),

    #[error("Search backend did not answer {operation} within {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Search backend failure: {0}")]
    Internal(String),
}

/// Opaque search engine. Implementations own their concurrency discipline.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Short name of the engine, reported by health checks.
    fn kind(&self) -> &'static str;

    /// Ranked matches, best first, at most `query.limit` of them.
    /// When `query.collection` is set every result belongs to it.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, BackendError>;

    async fn get_document(&self, id: &str) -> Result<Option<Document>, BackendError>;

    /// Insert or replace a document by id.
    async fn upsert_document(&self, document: Document) -> Result<(), BackendError>;

    /// Returns `false` when no document had that id.
    async fn delete_document(&self, id: &str) -> Result<bool, BackendError>;

    async fn list_collections(&self) -> Result<Vec<CollectionStats>, BackendError>;

    /// Rebuild derived index data; returns the number of indexed documents.
    async fn rebuild(&self) -> Result<usize, BackendError>;

    async fn stats(&self) -> Result<BackendStats, BackendError>;
}

/// A no-op backend that stores nothing and never matches.
/// Used for fast startup when search is not needed.
pub struct NoopSearchBackend;

#[async_trait]
impl SearchBackend for NoopSearchBackend {
    fn kind(&self) -> &'static str {
        "noop"
    }

    async fn search(&self, _query: &SearchQuery) -> Result<Vec<SearchResult>, BackendError> {
        Ok(Vec::new())
    }

    async fn get_document(&self, _id: &str) -> Result<Option<Document>, BackendError> {
        Ok(None)
    }

    async fn upsert_document(&self, _document: Document) -> Result<(), BackendError> {
        Ok(())
    }

    async fn delete_document(&self, _id: &str) -> Result<bool, BackendError> {
        Ok(false)
    }

    async fn list_collections(&self) -> Result<Vec<CollectionStats>, BackendError> {
        Ok(Vec::new())
    }

    async fn rebuild(&self) -> Result<usize, BackendError> {
        Ok(0)
    }

    async fn stats(&self) -> Result<BackendStats, BackendError> {
        Ok(BackendStats {
            kind: self.kind().to_string(),
            documents: 0,
            collections: 0,
        })
    }
}
