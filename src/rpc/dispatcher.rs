//! Dispatcher
//!
//! Resolves an envelope against the registry, validates its params, runs the
//! handler with panic isolation and maps the outcome into a
//! [`ResponseEnvelope`]. Batches fan out onto separate tasks, bounded by a
//! semaphore plus a capped wait queue.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::{debug, error, warn};

use super::context::{AppServices, MethodContext};
use super::envelope::{RequestEnvelope, ResponseEnvelope};
use super::error::DispatchError;
use super::registry::MethodRegistry;
use crate::config::DispatchSettings;
use crate::server::metrics;

#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    registry: Arc<MethodRegistry>,
    services: Arc<AppServices>,
    permits: Arc<Semaphore>,
    queued: AtomicUsize,
    settings: DispatchSettings,
}

/// Holds one slot of the admission wait queue until dropped.
struct QueueSlot<'a>(&'a AtomicUsize);

impl Drop for QueueSlot<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Dispatcher {
    pub fn new(
        registry: Arc<MethodRegistry>,
        services: Arc<AppServices>,
        settings: DispatchSettings,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(settings.max_in_flight.max(1)));
        Self {
            inner: Arc::new(DispatcherInner {
                registry,
                services,
                permits,
                queued: AtomicUsize::new(0),
                settings,
            }),
        }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.inner.registry
    }

    pub fn services(&self) -> &Arc<AppServices> {
        &self.inner.services
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.inner.settings
    }

    /// Runs one call. Always yields a response envelope, even for
    /// notifications; adapters decide whether to send it.
    pub async fn dispatch(&self, envelope: RequestEnvelope) -> ResponseEnvelope {
        let started = Instant::now();
        let id = envelope.id.clone();
        let label = if self.inner.registry.contains(&envelope.method) {
            envelope.method.clone()
        } else {
            "unknown".to_string()
        };

        let outcome = self.execute(envelope).await;

        let outcome_label = match &outcome {
            Ok(_) => "ok",
            Err(err) => err.kind().as_str(),
        };
        metrics::record_dispatch(&label, outcome_label, started.elapsed());
        debug!(
            "Dispatched {} -> {} in {}ms",
            label,
            outcome_label,
            started.elapsed().as_millis()
        );

        ResponseEnvelope { id, outcome }
    }

    /// Dispatches every member concurrently and waits for all of them.
    /// Only members carrying an id get a response.
    pub async fn dispatch_batch(&self, requests: Vec<RequestEnvelope>) -> Vec<ResponseEnvelope> {
        metrics::record_batch_size(requests.len());

        let handles: Vec<_> = requests
            .into_iter()
            .map(|envelope| {
                let id = envelope.id.clone();
                let dispatcher = self.clone();
                let handle =
                    tokio::spawn(async move { dispatcher.dispatch_admitted(envelope).await });
                (id, handle)
            })
            .collect();

        let responses = join_all(handles.into_iter().map(|(id, handle)| async move {
            match handle.await {
                Ok(response) => response,
                Err(join_error) => {
                    error!("Batch member {:?} task failed: {}", id, join_error);
                    ResponseEnvelope::failure(
                        id,
                        DispatchError::Internal("batch member task failed".to_string()),
                    )
                }
            }
        }))
        .await;

        responses
            .into_iter()
            .filter(|response| response.id.is_some())
            .collect()
    }

    /// Resolves `name` as a tool and dispatches `arguments` to it.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, DispatchError> {
        match self.inner.registry.resolve(name) {
            Ok(method) if method.exposed_as_tool => {}
            _ => return Err(DispatchError::MethodNotFound(name.to_string())),
        }
        self.dispatch(RequestEnvelope::new(name, arguments))
            .await
            .outcome
    }

    async fn dispatch_admitted(&self, envelope: RequestEnvelope) -> ResponseEnvelope {
        let _permit = match self.admit().await {
            Ok(permit) => permit,
            Err(err) => return ResponseEnvelope::failure(envelope.id, err),
        };
        self.dispatch(envelope).await
    }

    async fn admit(&self) -> Result<OwnedSemaphorePermit, DispatchError> {
        match self.inner.permits.clone().try_acquire_owned() {
            Ok(permit) => return Ok(permit),
            Err(TryAcquireError::Closed) => {
                return Err(DispatchError::BackendUnavailable(
                    "dispatcher is shutting down".to_string(),
                ))
            }
            Err(TryAcquireError::NoPermits) => {}
        }

        let waiting = self.inner.queued.fetch_add(1, Ordering::SeqCst);
        let _slot = QueueSlot(&self.inner.queued);
        if waiting >= self.inner.settings.max_queue_depth {
            warn!(
                "Dispatch queue full ({} waiting), rejecting batch member",
                waiting
            );
            metrics::record_batch_rejection("queue_full");
            return Err(DispatchError::BackendUnavailable(format!(
                "dispatch queue is full ({} in flight, {} waiting)",
                self.inner.settings.max_in_flight, waiting
            )));
        }

        self.inner
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| DispatchError::BackendUnavailable("dispatcher is shutting down".to_string()))
    }

    async fn execute(&self, envelope: RequestEnvelope) -> Result<Value, DispatchError> {
        if envelope.method.trim().is_empty() {
            return Err(DispatchError::ParseError(
                "method must not be empty".to_string(),
            ));
        }

        let future = {
            let method = self.inner.registry.resolve(&envelope.method)?;
            method.params_schema.validate(&envelope.params)?;
            let ctx = MethodContext {
                services: self.inner.services.clone(),
                dispatcher: self.clone(),
            };
            (method.handler)(ctx, envelope.params)
        };

        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Handler for {} panicked: {}", envelope.method, message);
                Err(DispatchError::Internal(format!(
                    "handler for {} failed unexpectedly",
                    envelope.method
                )))
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchSettings;
    use crate::rpc::protocol::RequestId;
    use crate::rpc::registry::MethodBuilder;
    use crate::rpc::ErrorKind;
    use crate::search::{InMemorySearchBackend, SearchService};
    use serde_json::json;
    use std::collections::HashSet;
    use std::time::Duration;

    fn services() -> Arc<AppServices> {
        let search = SearchService::new(
            Arc::new(InMemorySearchBackend::new()),
            SearchSettings::default(),
        );
        Arc::new(AppServices::new("test", "0.0.0-test", search))
    }

    fn registry(counter: Arc<AtomicUsize>) -> MethodRegistry {
        let mut registry = MethodRegistry::new();
        registry
            .register(
                MethodBuilder::new("echo")
                    .params_schema(json!({
                        "type": "object",
                        "properties": {"value": {"type": "integer"}},
                        "required": ["value"]
                    }))
                    .tool()
                    .build(|_ctx, params| async move { Ok(params["value"].clone()) })
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                MethodBuilder::new("hidden")
                    .build(|_ctx, _params| async move { Ok(json!("secret")) })
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                MethodBuilder::new("explode")
                    .build(|_ctx, _params| async move {
                        if true {
                            panic!("handler blew up");
                        }
                        Ok(Value::Null)
                    })
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                MethodBuilder::new("count")
                    .build(move |_ctx, _params| {
                        let counter = counter.clone();
                        async move {
                            counter.fetch_add(1, Ordering::SeqCst);
                            Ok(Value::Null)
                        }
                    })
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                MethodBuilder::new("slow")
                    .build(|_ctx, _params| async move {
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        Ok(json!("done"))
                    })
                    .unwrap(),
            )
            .unwrap();
        registry
    }

    fn dispatcher_with(settings: DispatchSettings) -> (Dispatcher, Arc<AtomicUsize>) {
        let counter = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new(
            Arc::new(registry(counter.clone())),
            services(),
            settings,
        );
        (dispatcher, counter)
    }

    fn dispatcher() -> Dispatcher {
        dispatcher_with(DispatchSettings::default()).0
    }

    fn call(method: &str, params: Value, id: i64) -> RequestEnvelope {
        RequestEnvelope::new(method, params).with_id(RequestId::from(id))
    }

    #[tokio::test]
    async fn test_dispatch_success_echoes_id() {
        let response = dispatcher().dispatch(call("echo", json!({"value": 5}), 7)).await;
        assert_eq!(response.id, Some(RequestId::from(7)));
        assert_eq!(response.result(), Some(&json!(5)));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = dispatcher().dispatch(call("nope", json!({}), 1)).await;
        assert_eq!(response.error().unwrap().kind(), ErrorKind::MethodNotFound);
        assert_eq!(response.error().unwrap().code(), -32601);
    }

    #[tokio::test]
    async fn test_empty_method_is_parse_error() {
        let response = dispatcher().dispatch(call("", json!({}), 1)).await;
        assert_eq!(response.error().unwrap().kind(), ErrorKind::ParseError);
    }

    #[tokio::test]
    async fn test_invalid_params_names_field() {
        let response = dispatcher()
            .dispatch(call("echo", json!({"value": "five"}), 1))
            .await;
        match response.error() {
            Some(DispatchError::InvalidParams { field, .. }) => assert_eq!(field, "value"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_internal_error() {
        let response = dispatcher().dispatch(call("explode", json!({}), 3)).await;
        assert_eq!(response.id, Some(RequestId::from(3)));
        assert_eq!(response.error().unwrap().kind(), ErrorKind::InternalError);
    }

    #[tokio::test]
    async fn test_batch_correlates_every_id_once() {
        let dispatcher = dispatcher();
        let requests: Vec<_> = (1..=10)
            .map(|i| call("echo", json!({"value": i}), i))
            .collect();
        let responses = dispatcher.dispatch_batch(requests).await;
        assert_eq!(responses.len(), 10);
        let ids: HashSet<_> = responses.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids.len(), 10);
        for response in &responses {
            let Some(RequestId::Number(id)) = &response.id else {
                panic!("missing id");
            };
            assert_eq!(response.result(), Some(&json!(id)));
        }
    }

    #[tokio::test]
    async fn test_batch_member_failure_is_isolated() {
        let responses = dispatcher()
            .dispatch_batch(vec![
                call("echo", json!({"value": 1}), 1),
                call("explode", json!({}), 2),
                call("echo", json!({"value": 3}), 3),
            ])
            .await;
        assert_eq!(responses.len(), 3);
        let errors: Vec<_> = responses.iter().filter(|r| r.is_error()).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].id, Some(RequestId::from(2)));
    }

    #[tokio::test]
    async fn test_batch_notifications_run_without_response() {
        let (dispatcher, counter) = dispatcher_with(DispatchSettings::default());
        let responses = dispatcher
            .dispatch_batch(vec![
                RequestEnvelope::new("count", json!({})),
                call("count", json!({}), 1),
                RequestEnvelope::new("count", json!({})),
            ])
            .await;
        assert_eq!(responses.len(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_batch_over_queue_depth_rejects_members() {
        let (dispatcher, _) = dispatcher_with(DispatchSettings {
            max_in_flight: 1,
            max_queue_depth: 1,
        });
        let requests: Vec<_> = (1..=4).map(|i| call("slow", json!({}), i)).collect();
        let responses = dispatcher.dispatch_batch(requests).await;

        assert_eq!(responses.len(), 4);
        let rejected = responses
            .iter()
            .filter(|r| {
                r.error()
                    .map(|e| e.kind() == ErrorKind::BackendUnavailable)
                    .unwrap_or(false)
            })
            .count();
        let succeeded = responses.iter().filter(|r| !r.is_error()).count();
        assert!(rejected >= 1, "expected admission rejections");
        assert!(succeeded >= 1);
        assert_eq!(rejected + succeeded, 4);
    }

    #[tokio::test]
    async fn test_call_tool_only_reaches_exposed_methods() {
        let dispatcher = dispatcher();
        assert_eq!(
            dispatcher.call_tool("echo", json!({"value": 9})).await,
            Ok(json!(9))
        );
        assert_eq!(
            dispatcher.call_tool("hidden", json!({})).await,
            Err(DispatchError::MethodNotFound("hidden".to_string()))
        );
        assert!(matches!(
            dispatcher.call_tool("echo", json!({})).await,
            Err(DispatchError::InvalidParams { .. })
        ));
    }
}
