//! Domain methods
//!
//! Everything the service can do, registered once into the
//! [`MethodRegistry`] that every surface dispatches through.

pub mod documents;
pub mod service;
pub mod tools;

use std::sync::Arc;

use tracing::info;

use crate::config::DispatchSettings;
use crate::rpc::{AppServices, Dispatcher, MethodRegistry, RegistryError};

/// Register every domain method with the registry
pub fn register_all_methods(registry: &mut MethodRegistry) -> Result<(), RegistryError> {
    service::register_methods(registry)?;
    documents::register_methods(registry)?;
    tools::register_methods(registry)?;
    Ok(())
}

/// Builds the frozen registry and the dispatcher around it.
pub fn create_dispatcher(
    services: Arc<AppServices>,
    settings: DispatchSettings,
) -> Result<Dispatcher, RegistryError> {
    let mut registry = MethodRegistry::new();
    register_all_methods(&mut registry)?;

    info!(
        "Method registry initialized with {} methods ({} exposed as tools)",
        registry.len(),
        registry.tool_count()
    );

    Ok(Dispatcher::new(Arc::new(registry), services, settings))
}
