//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own in-memory index.

use super::constants::*;
use super::fixtures::create_seed_file;
use doc_indexer::config::{DispatchSettings, SearchSettings, StreamingSettings};
use doc_indexer::methods::create_dispatcher;
use doc_indexer::rpc::{AppServices, Dispatcher};
use doc_indexer::search::{create_search_backend, load_seed_documents, SearchEngine, SearchService};
use doc_indexer::server::{make_app, RequestsLoggingLevel, ServerConfig, ServerState};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Test server instance with an isolated, seeded index
///
/// When dropped, the server gracefully shuts down.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// The dispatcher behind every surface, for direct calls in tests
    pub dispatcher: Dispatcher,

    // Private fields - keep resources alive until drop
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port with default settings
    pub async fn spawn() -> Self {
        Self::spawn_with(
            DispatchSettings::default(),
            StreamingSettings {
                tick_interval: Duration::from_millis(200),
                keep_alive: Duration::from_secs(15),
            },
        )
        .await
    }

    /// Spawns a new test server on a random port
    ///
    /// This function:
    /// 1. Writes the seed corpus to a temporary file and loads it
    /// 2. Builds the dispatcher the same way the binary does
    /// 3. Binds to a random port (127.0.0.1:0)
    /// 4. Spawns the server in a background task
    /// 5. Waits for the server to be ready
    ///
    /// # Panics
    ///
    /// Panics if the seed corpus cannot be loaded, the port cannot be bound
    /// or the server doesn't become ready within timeout.
    pub async fn spawn_with(dispatch: DispatchSettings, streaming: StreamingSettings) -> Self {
        let seed_file = create_seed_file().expect("Failed to create seed file");
        let documents = load_seed_documents(seed_file.path()).expect("Failed to load seed file");
        assert_eq!(documents.len(), SEED_DOCUMENT_COUNT);

        let backend = create_search_backend(SearchEngine::Memory, documents);
        let search = SearchService::new(backend, SearchSettings::default());
        let services = Arc::new(AppServices::new("doc-indexer-e2e", "0.0.0-e2e", search));
        let dispatcher = create_dispatcher(services, dispatch).expect("Failed to build dispatcher");

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            metrics_port: 0,
            requests_logging_level: RequestsLoggingLevel::None,
            streaming,
        };
        let app = make_app(ServerState::new(config, dispatcher.clone(), "e2e"));

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            dispatcher,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
