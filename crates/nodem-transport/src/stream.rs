//! Generic stream transport shared by the socket-based transports.
//!
//! Unix domain sockets and TCP sockets behave identically once connected:
//! a zero-length read is end-of-stream, writes are flushed immediately, and
//! reset/broken-pipe errors mean the peer went away. [`StreamTransport`]
//! implements the [`Transport`] trait once for any such stream.

use async_trait::async_trait;
use nodem_core::error::{Error, Result};
use nodem_core::transport::Transport;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// A [`Transport`] over any connected duplex byte stream.
#[derive(Debug)]
pub struct StreamTransport<S> {
    /// The underlying stream, `None` after `close()` is called.
    stream: Option<S>,
    /// Peer label for logging (socket path or `host:port`).
    peer: String,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + Sync,
{
    /// Wrap an already-connected stream.
    pub fn new(stream: S, peer: String) -> Self {
        tracing::debug!(peer = %peer, "Wrapping connected stream");
        Self {
            stream: Some(stream),
            peer,
        }
    }

    /// The peer label this transport was created with.
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

#[async_trait]
impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + Sync,
{
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(peer = %self.peer, bytes = data.len(), data = ?data, "Sending data");

        stream.write_all(data).await.map_err(|e| {
            tracing::error!(peer = %self.peer, error = %e, "Failed to send data");
            map_io_error(e)
        })?;

        stream.flush().await.map_err(|e| {
            tracing::error!(peer = %self.peer, error = %e, "Failed to flush stream");
            map_io_error(e)
        })?;

        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        match tokio::time::timeout(timeout, stream.read(buf)).await {
            Ok(Ok(0)) => {
                tracing::debug!(peer = %self.peer, "Peer closed stream");
                Err(Error::ConnectionLost)
            }
            Ok(Ok(n)) => {
                tracing::trace!(peer = %self.peer, bytes = n, data = ?&buf[..n], "Received data");
                Ok(n)
            }
            Ok(Err(e)) => {
                tracing::error!(peer = %self.peer, error = %e, "Failed to receive data");
                Err(map_io_error(e))
            }
            Err(_) => Err(Error::Timeout),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.flush().await {
                tracing::warn!(peer = %self.peer, error = %e, "Failed to flush before closing");
            }
            if let Err(e) = stream.shutdown().await {
                tracing::warn!(peer = %self.peer, error = %e, "Failed to shut down stream");
            }
            tracing::info!(peer = %self.peer, "Stream closed");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

/// Map a data-path I/O error to the appropriate [`Error`] variant.
pub(crate) fn map_io_error(e: std::io::Error) -> Error {
    match e.kind() {
        std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::BrokenPipe
        | std::io::ErrorKind::NotConnected
        | std::io::ErrorKind::ConnectionAborted
        | std::io::ErrorKind::UnexpectedEof => Error::ConnectionLost,
        _ => Error::Io(e),
    }
}
