//! Unix domain socket transport.
//!
//! QEMU can expose a guest serial port as a Unix socket
//! (`-serial unix:/tmp/nodem.sock,server`). nodem dials that socket and runs
//! one modem session on it, so the guest sees a Hayes modem on its UART.

use nodem_core::error::{Error, Result};
use std::path::Path;
use tokio::net::UnixStream;

use crate::stream::StreamTransport;

/// A [`StreamTransport`] over a Unix domain socket.
pub type UnixTransport = StreamTransport<UnixStream>;

impl StreamTransport<UnixStream> {
    /// Connect to the Unix socket at `path`.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let label = path.display().to_string();
        tracing::debug!(path = %label, "Connecting to Unix socket");

        let stream = UnixStream::connect(path).await.map_err(|e| {
            tracing::error!(path = %label, error = %e, "Unix socket connection failed");
            match e.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::ConnectionRefused => {
                    Error::Transport(format!("cannot connect to {}: {}", label, e))
                }
                _ => Error::Io(e),
            }
        })?;

        tracing::info!(path = %label, "Unix socket connected");
        Ok(StreamTransport::new(stream, label))
    }
}
