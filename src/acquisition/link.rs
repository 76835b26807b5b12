//! Buffered duplex line link over any byte transport.

use async_trait::async_trait;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadBuf};

use super::{LineEvent, LineSink, LineSource, TransportError};
use crate::config::defaults::LINE_BUFFER_CAPACITY;

/// Byte transport underneath a [`LineLink`].
///
/// The hooks default to no-ops; the serial port overrides them with the
/// driver's input queue.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {
    /// Bytes waiting in the OS driver.
    fn driver_pending(&self) -> usize {
        0
    }

    /// Drop bytes waiting in the OS driver.
    fn clear_input(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Transport for tokio::io::DuplexStream {}

/// Stdin for records, stdout for commands. Used when piping the simulator.
pub struct StdioTransport {
    stdin: tokio::io::Stdin,
    stdout: tokio::io::Stdout,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self {
            stdin: tokio::io::stdin(),
            stdout: tokio::io::stdout(),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncRead for StdioTransport {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stdin).poll_read(cx, buf)
    }
}

impl AsyncWrite for StdioTransport {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.stdout).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stdout).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.stdout).poll_shutdown(cx)
    }
}

impl Transport for StdioTransport {}

/// Newline-delimited record link with an optional per-line read timeout.
pub struct LineLink<T: Transport> {
    reader: BufReader<T>,
    /// Bytes of the record currently being assembled; survives timeouts
    /// and cancelled reads.
    line_buffer: Vec<u8>,
    read_timeout: Option<Duration>,
    name: String,
    at_eof: bool,
}

impl<T: Transport> LineLink<T> {
    pub fn new(transport: T, name: impl Into<String>) -> Self {
        Self {
            reader: BufReader::new(transport),
            line_buffer: Vec::with_capacity(LINE_BUFFER_CAPACITY),
            read_timeout: None,
            name: name.into(),
            at_eof: false,
        }
    }

    /// Set the per-line read timeout. `Duration::ZERO` disables it.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Flush and shut down the write half, releasing the transport.
    pub async fn close(mut self) -> Result<(), TransportError> {
        tracing::debug!(link = %self.name, "Closing line link");
        self.reader.get_mut().shutdown().await?;
        Ok(())
    }

    /// Read until `\n`, returning the byte count of this call (0 = EOF).
    async fn fill_line(&mut self) -> Result<Option<usize>, TransportError> {
        let read = self.reader.read_until(b'\n', &mut self.line_buffer);
        match self.read_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, read).await {
                Ok(result) => Ok(Some(result?)),
                Err(_) => Ok(None),
            },
            None => Ok(Some(read.await?)),
        }
    }
}

#[async_trait]
impl<T: Transport> LineSource for LineLink<T> {
    async fn next_line(&mut self) -> Result<LineEvent, TransportError> {
        if self.at_eof {
            return Ok(LineEvent::Eof);
        }

        let Some(bytes) = self.fill_line().await? else {
            return Ok(LineEvent::TimedOut);
        };

        if bytes == 0 {
            self.at_eof = true;
            // Trailing record without terminator
            if !self.line_buffer.is_empty() {
                return Ok(LineEvent::Line(std::mem::take(&mut self.line_buffer)));
            }
            return Ok(LineEvent::Eof);
        }

        let line = std::mem::replace(&mut self.line_buffer, Vec::with_capacity(LINE_BUFFER_CAPACITY));
        Ok(LineEvent::Line(line))
    }

    async fn discard_input(&mut self) -> Result<(), TransportError> {
        self.line_buffer.clear();
        let buffered = self.reader.buffer().len();
        self.reader.consume(buffered);
        self.reader.get_mut().clear_input()?;

        // The next record may start mid-line; throw it away.
        match self.next_line().await? {
            LineEvent::Line(line) => {
                tracing::debug!(link = %self.name, bytes = line.len(), "Discarded leading record");
            }
            LineEvent::TimedOut => {
                tracing::debug!(link = %self.name, "No leading record before timeout");
            }
            LineEvent::Eof => {}
        }
        Ok(())
    }

    fn pending_input(&self) -> usize {
        self.line_buffer.len() + self.reader.buffer().len() + self.reader.get_ref().driver_pending()
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl<T: Transport> LineSink for LineLink<T> {
    async fn send_command(&mut self, command: &[u8]) -> Result<(), TransportError> {
        let writer = self.reader.get_mut();
        writer.write_all(command).await?;
        writer.flush().await?;
        Ok(())
    }
}
