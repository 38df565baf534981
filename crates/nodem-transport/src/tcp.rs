//! TCP transport for modem sessions.
//!
//! The `nodem --listen` mode accepts TCP connections and runs one session on
//! each; [`TcpTransport::from_stream`] wraps the accepted stream. Terminal
//! programs that speak raw TCP (or `socat`) can then talk AT commands to the
//! emulated modem. [`TcpTransport::connect`] dials out instead, for hosts
//! that expose their serial port as a TCP server.

use nodem_core::error::{Error, Result};
use std::time::Duration;
use tokio::net::TcpStream;

use crate::stream::StreamTransport;

/// Default connection timeout (5 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A [`StreamTransport`] over a TCP socket.
pub type TcpTransport = StreamTransport<TcpStream>;

impl StreamTransport<TcpStream> {
    /// Connect to a `host:port` endpoint using the default timeout.
    pub async fn connect(addr: &str) -> Result<Self> {
        Self::connect_with_timeout(addr, DEFAULT_CONNECT_TIMEOUT).await
    }

    /// Connect to a `host:port` endpoint with a specified timeout.
    pub async fn connect_with_timeout(addr: &str, timeout: Duration) -> Result<Self> {
        tracing::debug!(addr = %addr, timeout_ms = timeout.as_millis(), "Connecting to TCP endpoint");

        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| {
                tracing::error!(addr = %addr, "TCP connection timed out");
                Error::Timeout
            })?
            .map_err(|e| {
                tracing::error!(addr = %addr, error = %e, "TCP connection failed");
                map_connect_error(e, addr)
            })?;

        tracing::info!(addr = %addr, "TCP connection established");
        Ok(Self::from_stream(stream, addr.to_string()))
    }

    /// Wrap an accepted or externally connected `TcpStream`.
    ///
    /// Nagle's algorithm is disabled: echoes are single bytes and must not
    /// be held back waiting for more data.
    pub fn from_stream(stream: TcpStream, addr: String) -> Self {
        if let Err(e) = stream.set_nodelay(true) {
            tracing::warn!(addr = %addr, error = %e, "Failed to set TCP_NODELAY (continuing anyway)");
        }
        StreamTransport::new(stream, addr)
    }
}

/// Map a connection-time I/O error to the appropriate [`Error`] variant.
fn map_connect_error(e: std::io::Error, addr: &str) -> Error {
    match e.kind() {
        std::io::ErrorKind::ConnectionRefused => {
            Error::Transport(format!("connection refused: {}", addr))
        }
        _ => Error::Io(e),
    }
}
