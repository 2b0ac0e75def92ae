mod backend;
mod document;
mod factory;
mod memory_backend;
mod service;

#[cfg(any(test, feature = "mock"))]
pub use backend::MockSearchBackend;
pub use backend::{
    BackendError, BackendStats, NoopSearchBackend, SearchBackend, SearchQuery, SearchResult,
};
pub use document::{
    load_seed_documents, CollectionStats, Document, DEFAULT_COLLECTION, DEFAULT_DOC_TYPE,
};
pub use factory::{create_search_backend, SearchEngine};
pub use memory_backend::InMemorySearchBackend;
pub use service::SearchService;
