//! TCP transport for serial-over-network bridges (ser2net and similar).

use std::time::Duration;
use tokio::net::TcpStream;

use super::{LineLink, Transport, TransportError};

/// Connect timeout for the bridge.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

impl Transport for TcpStream {}

/// Connect to `addr` (`HOST:PORT`) with keepalive enabled.
pub async fn connect_tcp(
    addr: &str,
    read_timeout: Duration,
) -> Result<LineLink<TcpStream>, TransportError> {
    tracing::info!(address = %addr, "Connecting to serial bridge");

    let open_err = |message: String| TransportError::Open {
        target: addr.to_string(),
        message,
    };

    let stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
        .await
        .map_err(|_| open_err(format!("timed out after {}s", CONNECT_TIMEOUT.as_secs())))?
        .map_err(|e| open_err(e.to_string()))?;

    // Detect a dead bridge even while the sensor is silent
    let sock_ref = socket2::SockRef::from(&stream);
    let keepalive = socket2::TcpKeepalive::new()
        .with_time(Duration::from_secs(30))
        .with_interval(Duration::from_secs(10));
    if let Err(e) = sock_ref.set_tcp_keepalive(&keepalive) {
        tracing::warn!(error = %e, "Failed to enable TCP keepalive");
    }
    if let Err(e) = stream.set_nodelay(true) {
        tracing::warn!(error = %e, "Failed to disable Nagle on serial bridge");
    }

    tracing::info!(address = %addr, "Serial bridge connected");
    Ok(LineLink::new(stream, format!("tcp:{addr}")).with_read_timeout(read_timeout))
}
