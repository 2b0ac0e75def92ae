//! Timeout-guarded access to the configured search backend.

use super::backend::{BackendError, BackendStats, SearchBackend, SearchQuery, SearchResult};
use super::document::{CollectionStats, Document};
use crate::config::SearchSettings;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct SearchService {
    backend: Arc<dyn SearchBackend>,
    settings: SearchSettings,
}

impl SearchService {
    pub fn new(backend: Arc<dyn SearchBackend>, settings: SearchSettings) -> Self {
        Self { backend, settings }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn backend_kind(&self) -> &'static str {
        self.backend.kind()
    }

    /// Applies the configured default when `requested` is absent and clamps
    /// to the configured maximum.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.settings.default_limit)
            .min(self.settings.max_limit)
    }

    async fn guarded<T, F>(&self, operation: &str, fut: F) -> Result<T, BackendError>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        match tokio::time::timeout(self.settings.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = self.settings.timeout.as_millis() as u64;
                warn!("Search backend {} timed out after {}ms", operation, timeout_ms);
                Err(BackendError::Timeout {
                    operation: operation.to_string(),
                    timeout_ms,
                })
            }
        }
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, BackendError> {
        self.guarded("search", self.backend.search(query)).await
    }

    pub async fn get_document(&self, id: &str) -> Result<Option<Document>, BackendError> {
        self.guarded("get_document", self.backend.get_document(id))
            .await
    }

    pub async fn upsert_document(&self, document: Document) -> Result<(), BackendError> {
        self.guarded("upsert_document", self.backend.upsert_document(document))
            .await
    }

    pub async fn delete_document(&self, id: &str) -> Result<bool, BackendError> {
        self.guarded("delete_document", self.backend.delete_document(id))
            .await
    }

    pub async fn list_collections(&self) -> Result<Vec<CollectionStats>, BackendError> {
        self.guarded("list_collections", self.backend.list_collections())
            .await
    }

    pub async fn rebuild(&self) -> Result<usize, BackendError> {
        self.guarded("rebuild", self.backend.rebuild()).await
    }

    pub async fn stats(&self) -> Result<BackendStats, BackendError> {
        self.guarded("stats", self.backend.stats()).await
    }
}
