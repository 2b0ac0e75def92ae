//! JSONL transport over AsyncBufRead/AsyncWrite.

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// The line was read but is not UTF-8; the stream itself is still usable.
    #[error("line is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

impl TransportError {
    /// True when only the current line is bad and reading can go on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TransportError::InvalidUtf8(_))
    }
}

/// Reads raw lines and writes one JSON value per line.
///
/// Generic over reader and writer so tests can use in-memory buffers.
pub struct JsonlTransport<R, W> {
    reader: R,
    writer: W,
}

impl<R: AsyncBufRead + Unpin, W: AsyncWrite + Unpin> JsonlTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Next non-blank line with surrounding whitespace trimmed, or `None` at EOF.
    ///
    /// A line that is not UTF-8 is consumed whole and reported as
    /// [`TransportError::InvalidUtf8`], leaving the reader at the next line.
    pub async fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if self.reader.read_until(b'\n', &mut buf).await? == 0 {
                return Ok(None);
            }
            let line = String::from_utf8(std::mem::take(&mut buf))?;
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
    }

    pub async fn write_message<T: Serialize>(&mut self, message: &T) -> Result<(), TransportError> {
        let json = serde_json::to_string(message)?;
        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}
