//! Stream Transport
//!
//! A single session over any line-oriented byte stream.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

use crate::Result;
use crate::server::ActionsMcpServer;

/// Reads newline-delimited JSON-RPC messages and writes one response line
/// per request.
///
/// Messages are handled strictly in order: the next line is not read until
/// the previous response has been written. Blank lines are skipped and EOF
/// ends the session cleanly. A line that is not valid UTF-8 is answered with
/// a parse error and the session continues.
pub struct StreamTransport<R, W> {
    reader: R,
    writer: W,
}

impl StreamTransport<BufReader<Stdin>, Stdout> {
    /// Transport over the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> StreamTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Serve until the input is exhausted.
    pub async fn run(mut self, server: &ActionsMcpServer) -> Result<()> {
        tracing::info!("MCP server ready, listening on stream transport");

        let mut buf = Vec::new();
        loop {
            buf.clear();
            if self.reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            let response = match std::str::from_utf8(&buf) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    tracing::debug!(request = %line, "Received message");
                    server.respond(line).await
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Received a line that is not valid UTF-8");
                    server.parse_error(&format!("invalid UTF-8: {}", e))
                }
            };

            if let Some(response) = response {
                self.writer.write_all(response.as_bytes()).await?;
                self.writer.write_all(b"\n").await?;
                self.writer.flush().await?;
            }
        }

        tracing::info!("Input closed, stream transport shutting down");
        Ok(())
    }
}
