//! Factory function for creating search backend instances

use super::{Document, InMemorySearchBackend, NoopSearchBackend, SearchBackend};
use clap::ValueEnum;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SearchEngine {
    /// In-process term-overlap index
    #[default]
    Memory,
    /// Stores nothing, every search returns no results
    Noop,
}

/// Create a search backend based on the configured search engine, seeded
/// with `documents`.
pub fn create_search_backend(
    engine: SearchEngine,
    documents: Vec<Document>,
) -> Arc<dyn SearchBackend> {
    match engine {
        SearchEngine::Memory => {
            info!(
                "Creating in-memory search backend with {} seed documents",
                documents.len()
            );
            Arc::new(InMemorySearchBackend::with_documents(documents))
        }
        SearchEngine::Noop => {
            if !documents.is_empty() {
                info!("Ignoring {} seed documents", documents.len());
            }
            info!("Creating NoOp search backend (search disabled)");
            Arc::new(NoopSearchBackend)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_backend_is_seeded() {
        let backend = create_search_backend(
            SearchEngine::Memory,
            vec![Document::new("1", "docs-a", "Title", "body")],
        );
        assert_eq!(backend.kind(), "memory");
        assert_eq!(backend.stats().await.unwrap().documents, 1);
    }

    #[test]
    fn test_engine_parses_case_insensitive() {
        assert_eq!(
            SearchEngine::from_str("NOOP", true).unwrap(),
            SearchEngine::Noop
        );
    }
}
