//! Stream Publisher
//!
//! Each subscriber gets its own session task. The task turns ticks and bus
//! changes into serialized [`StreamEvent`]s and pushes them down a bounded
//! channel until the subscriber goes away.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, Stream};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, warn};

use super::{HEALTH_TOPIC, INDEX_TOPIC};
use crate::config::StreamingSettings;
use crate::rpc::methods::HEALTH_CHECK;
use crate::rpc::{Dispatcher, RequestEnvelope};
use crate::server::metrics;

const SESSION_BUFFER: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Health,
    Index,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Health => "health",
            StreamKind::Index => "index",
        }
    }

    pub fn topic(&self) -> &'static str {
        match self {
            StreamKind::Health => HEALTH_TOPIC,
            StreamKind::Index => INDEX_TOPIC,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamEvent {
    pub topic: String,
    pub sequence: u64,
    pub payload: Value,
}

/// Per-topic sequence numbers, starting at 1.
#[derive(Default)]
struct Sequencer {
    next: HashMap<String, u64>,
}

impl Sequencer {
    fn next(&mut self, topic: &str) -> u64 {
        let counter = self.next.entry(topic.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }
}

#[derive(Clone)]
pub struct StreamPublisher {
    dispatcher: Dispatcher,
    tick_interval: Duration,
}

impl StreamPublisher {
    pub fn new(dispatcher: Dispatcher, settings: &StreamingSettings) -> Self {
        Self {
            dispatcher,
            tick_interval: settings.tick_interval,
        }
    }

    /// Starts a session task. Dropping the returned session stops it.
    pub fn open(&self, kind: StreamKind) -> StreamSession {
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);
        let token = CancellationToken::new();
        let task = SessionTask {
            kind,
            dispatcher: self.dispatcher.clone(),
            tick_interval: self.tick_interval,
            token: token.clone(),
            tx,
        };
        tokio::spawn(task.run());

        StreamSession {
            kind,
            receiver: rx,
            _guard: token.drop_guard(),
        }
    }
}

pub struct StreamSession {
    kind: StreamKind,
    receiver: mpsc::Receiver<String>,
    _guard: DropGuard,
}

impl StreamSession {
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// Next serialized event, or `None` once the session task has ended.
    pub async fn next_frame(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    pub fn into_stream(self) -> impl Stream<Item = String> + Send + 'static {
        stream::unfold(self, |mut session| async move {
            session.next_frame().await.map(|frame| (frame, session))
        })
    }
}

struct SessionTask {
    kind: StreamKind,
    dispatcher: Dispatcher,
    tick_interval: Duration,
    token: CancellationToken,
    tx: mpsc::Sender<String>,
}

impl SessionTask {
    async fn run(self) {
        let stream_name = self.kind.as_str();
        metrics::stream_session_opened(stream_name);
        debug!("Stream session opened: {}", stream_name);

        let mut changes = self.dispatcher.services().events.subscribe();
        let mut ticker = tokio::time::interval(self.tick_interval);
        let mut sequencer = Sequencer::default();
        let forwards_changes = self.kind == StreamKind::Index;

        loop {
            let payload = tokio::select! {
                _ = self.token.cancelled() => break,
                _ = self.tx.closed() => break,
                _ = ticker.tick() => match self.tick_payload().await {
                    Some(payload) => payload,
                    None => break,
                },
                change = changes.recv(), if forwards_changes => match change {
                    Ok(change) if change.topic == self.kind.topic() => change.payload,
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Stream {} lagged, skipped {} changes", stream_name, skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
            };

            let topic = self.kind.topic();
            let event = StreamEvent {
                topic: topic.to_string(),
                sequence: sequencer.next(topic),
                payload,
            };
            let frame = match serde_json::to_string(&event) {
                Ok(frame) => frame,
                Err(e) => {
                    error!("Failed to serialize stream event, closing {}: {}", stream_name, e);
                    break;
                }
            };
            if self.tx.send(frame).await.is_err() {
                break;
            }
            metrics::record_stream_event(topic);
        }

        metrics::stream_session_closed(stream_name);
        debug!("Stream session closed: {}", stream_name);
    }

    /// `None` ends the session.
    async fn tick_payload(&self) -> Option<Value> {
        match self.kind {
            StreamKind::Health => {
                let response = self
                    .dispatcher
                    .dispatch(RequestEnvelope::new(HEALTH_CHECK, json!({})))
                    .await;
                match response.outcome {
                    Ok(report) => Some(report),
                    Err(e) => {
                        error!("Health tick failed, closing stream: {}", e);
                        None
                    }
                }
            }
            StreamKind::Index => Some(json!({
                "event": "heartbeat",
                "timestamp": Utc::now().to_rfc3339(),
            })),
        }
    }
}
