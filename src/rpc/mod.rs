//! Unified dispatch core
//!
//! One registry of domain methods invoked the same way whichever surface
//! (REST, JSON-RPC, MCP, stdio, SSE) framed the request.

pub mod context;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod jsonrpc;
pub mod protocol;
pub mod registry;
pub mod schema;

pub use context::{AppServices, MethodContext};
pub use dispatcher::Dispatcher;
pub use envelope::{RequestEnvelope, ResponseEnvelope};
pub use error::{DispatchError, ErrorKind};
pub use jsonrpc::{JsonRpcEndpoint, JsonRpcReply};
pub use protocol::{methods, JsonRpcResponse, RequestId};
pub use registry::{MethodBuilder, MethodRegistry, RegisteredMethod, RegistryError};
