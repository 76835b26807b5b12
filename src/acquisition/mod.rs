//! Sensor data acquisition module
//!
//! Provides the duplex line channel every mode runs on:
//! - [`LineSource`]: yields one delimited record at a time
//! - [`LineSink`]: accepts outbound command tokens
//!
//! [`LineLink`] implements both over any byte transport (serial port,
//! TCP bridge, stdio pipe). Modes depend only on the traits.

pub mod parser;
mod link;
mod serial;
mod tcp;

pub use link::{LineLink, StdioTransport, Transport};
pub use parser::{parse_triple, ParseOutcome, SkipReason};
pub use serial::{list_ports, open_serial, PortInfo};
pub use tcp::connect_tcp;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Transport-level failures. Malformed content is never an error here;
/// it is a [`SkipReason`] at the parse stage.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to open {target}: {message}")]
    Open { target: String, message: String },

    #[error("Transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection closed")]
    Closed,
}

/// Events produced by a line source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// One record, terminator included.
    Line(Vec<u8>),
    /// No complete record arrived within the read timeout. Any partial
    /// bytes stay buffered and complete on a later read.
    TimedOut,
    /// The transport reached end of stream.
    Eof,
}

/// Where inbound records come from.
///
/// Mode loops call [`next_line`](LineSource::next_line) inside a `select!`
/// with cancellation, so implementations must keep partially read bytes
/// across a cancelled call.
#[async_trait]
pub trait LineSource: Send {
    /// Read the next record.
    ///
    /// Returns `Err` only for transport faults (disconnect, I/O error).
    async fn next_line(&mut self) -> Result<LineEvent, TransportError>;

    /// Drop stale input at the start of a mode: everything queued plus the
    /// next (possibly partial) record.
    async fn discard_input(&mut self) -> Result<(), TransportError>;

    /// Bytes received but not yet consumed, for diagnostics.
    fn pending_input(&self) -> usize {
        0
    }

    /// Human-readable name for logging (e.g. "serial:/dev/ttyUSB0").
    fn source_name(&self) -> &str;
}

/// Where outbound command tokens go.
#[async_trait]
pub trait LineSink: Send {
    /// Send raw command bytes. No acknowledgement, no retry.
    async fn send_command(&mut self, command: &[u8]) -> Result<(), TransportError>;
}

/// Run [`LineSource::discard_input`] unless `cancel` fires first.
///
/// Returns `Ok(false)` when cancelled. A silent source with no read
/// timeout would otherwise block the flush forever.
pub async fn discard_unless_cancelled<S>(
    source: &mut S,
    cancel: &CancellationToken,
) -> Result<bool, TransportError>
where
    S: LineSource + ?Sized,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Ok(false),
        result = source.discard_input() => result.map(|()| true),
    }
}
