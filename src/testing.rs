//! Fixtures shared by unit tests.

use std::sync::Arc;

use crate::config::{DispatchSettings, SearchSettings};
use crate::methods::create_dispatcher;
use crate::rpc::{AppServices, Dispatcher};
use crate::search::{Document, InMemorySearchBackend, SearchBackend, SearchService};

pub fn fixture_documents() -> Vec<Document> {
    vec![
        Document::new(
            "a-1",
            "docs-a",
            "Getting started",
            "Install the service, then run a first search against the sample collection.",
        )
        .with_section("Introduction"),
        Document::new(
            "a-2",
            "docs-a",
            "Search configuration",
            "Tune the default limit and the relevance threshold used by every search.",
        ),
        Document::new(
            "b-1",
            "docs-b",
            "Search API reference",
            "The search endpoint accepts a query, an optional collection filter and a limit.",
        ),
        Document::new(
            "b-2",
            "docs-b",
            "Deployment",
            "Run the binary behind a reverse proxy and expose the metrics port internally.",
        ),
    ]
}

pub fn dispatcher_with_backend(backend: Arc<dyn SearchBackend>) -> Dispatcher {
    let search = SearchService::new(backend, SearchSettings::default());
    let services = Arc::new(AppServices::new("doc-indexer-test", "0.0.0-test", search));
    match create_dispatcher(services, DispatchSettings::default()) {
        Ok(dispatcher) => dispatcher,
        Err(e) => panic!("registry failed to build: {}", e),
    }
}

pub fn seeded_dispatcher() -> Dispatcher {
    dispatcher_with_backend(Arc::new(InMemorySearchBackend::with_documents(
        fixture_documents(),
    )))
}
