//! stdio surface
//!
//! Newline-delimited JSON-RPC on stdin/stdout. One line is read, dispatched
//! and answered before the next one is read, so output order matches input
//! order. Logs go to stderr in this mode.

mod transport;

pub use transport::{JsonlTransport, TransportError};

use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tracing::{debug, info, warn};

use crate::rpc::{DispatchError, Dispatcher, JsonRpcEndpoint, JsonRpcResponse};

pub const STDIO_USAGE: &str = "\
doc-indexer stdio mode

Reads one JSON-RPC 2.0 request (or batch array) per line from stdin and
writes one response line to stdout. Notifications produce no output.
Logs are written to stderr.

Example:
  echo '{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"document.search\",\"params\":{\"query\":\"install\",\"filters\":{\"collection\":\"docs\"}}}' | doc-indexer --stdio

Methods:
  service.info, health.check, health.ready, health.live,
  document.search, document.get, document.index, document.delete,
  collection.list, index.rebuild, tools/list, tools/call,
  initialize, notifications/initialized, ping
";

pub fn print_stdio_usage() {
    print!("{}", STDIO_USAGE);
}

pub struct StdioServer {
    endpoint: JsonRpcEndpoint,
}

impl StdioServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            endpoint: JsonRpcEndpoint::new(dispatcher),
        }
    }

    /// Serves until EOF. Returns the number of lines handled.
    pub async fn run<R, W>(&self, reader: R, writer: W) -> Result<usize, TransportError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut transport = JsonlTransport::new(reader, writer);
        let mut handled = 0;
        loop {
            let line = match transport.read_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) if e.is_recoverable() => {
                    handled += 1;
                    warn!("stdio line {} rejected: {}", handled, e);
                    let error = DispatchError::ParseError(e.to_string());
                    transport
                        .write_message(&JsonRpcResponse::error(None, &error))
                        .await?;
                    continue;
                }
                Err(e) => return Err(e),
            };
            handled += 1;
            match self.endpoint.handle_text(&line).await {
                Some(reply) => transport.write_message(&reply).await?,
                None => debug!("stdio line {} produced no response", handled),
            }
        }
        info!("stdin closed after {} requests", handled);
        Ok(handled)
    }

    pub async fn run_stdio(&self) -> Result<usize, TransportError> {
        self.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }
}
