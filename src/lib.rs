//! Doc Indexer Library
//!
//! Document search and indexing behind one dispatch core, served over REST,
//! JSON-RPC 2.0, MCP, stdio and SSE.

pub mod config;
pub mod methods;
pub mod rpc;
pub mod search;
pub mod server;
pub mod stdio;
pub mod streaming;

#[cfg(test)]
mod testing;

pub use rpc::{Dispatcher, JsonRpcEndpoint};
pub use server::{run_server, RequestsLoggingLevel};

/// Short git hash of the build, or "unknown".
pub const GIT_HASH: &str = env!("GIT_HASH");

/// Version reported by `service.info` and `initialize`.
pub fn version() -> String {
    format!("{}-{}", env!("CARGO_PKG_VERSION"), GIT_HASH)
}
