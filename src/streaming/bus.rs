//! In-process fan-out of state changes to stream sessions.

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::trace;

const DEFAULT_CAPACITY: usize = 256;

/// A state change worth telling subscribers about.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    pub topic: String,
    pub payload: Value,
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StateChange>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes to current subscribers; with none listening the change is dropped.
    pub fn publish(&self, topic: impl Into<String>, payload: Value) {
        let change = StateChange {
            topic: topic.into(),
            payload,
        };
        match self.sender.send(change) {
            Ok(receivers) => trace!("State change delivered to {} subscribers", receivers),
            Err(_) => trace!("State change dropped, no subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
