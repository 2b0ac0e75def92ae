//! Method Execution Context
//!
//! Provides access to shared services for method implementations.

use std::sync::Arc;
use std::time::Instant;

use super::dispatcher::Dispatcher;
use super::registry::MethodRegistry;
use crate::search::SearchService;
use crate::streaming::EventBus;

/// Long-lived services shared by every call.
pub struct AppServices {
    /// Name reported by `service.info` and `initialize`
    pub service_name: String,

    /// Server version info
    pub version: String,

    /// Server start time (for uptime calculation)
    pub start_time: Instant,

    /// Access to search functionality
    pub search: SearchService,

    /// State changes pushed to stream subscribers
    pub events: EventBus,
}

impl AppServices {
    pub fn new(service_name: impl Into<String>, version: impl Into<String>, search: SearchService) -> Self {
        Self {
            service_name: service_name.into(),
            version: version.into(),
            start_time: Instant::now(),
            search,
            events: EventBus::default(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Context provided to method handlers during execution
#[derive(Clone)]
pub struct MethodContext {
    pub services: Arc<AppServices>,

    /// Lets a handler re-enter dispatch, as `tools/call` does.
    pub dispatcher: Dispatcher,
}

impl MethodContext {
    pub fn search(&self) -> &SearchService {
        &self.services.search
    }

    pub fn registry(&self) -> &MethodRegistry {
        self.dispatcher.registry()
    }
}
