//! Push streams
//!
//! State changes are published on an [`EventBus`]; every SSE subscriber gets
//! a [`StreamSession`] driven by its own task.

mod bus;
mod publisher;

pub use bus::{EventBus, StateChange};
pub use publisher::{StreamEvent, StreamKind, StreamPublisher, StreamSession};

/// Topic of periodic health reports.
pub const HEALTH_TOPIC: &str = "health";

/// Topic of document and index changes.
pub const INDEX_TOPIC: &str = "index";
