pub mod config;
mod http_layers;
mod jsonrpc;
pub mod metrics;
pub mod rest;
pub mod server;
pub mod state;
mod stream;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, make_metrics_app, run_server};
pub use state::ServerState;
