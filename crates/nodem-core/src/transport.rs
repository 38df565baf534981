//! Transport trait for the modem command channel.
//!
//! The [`Transport`] trait abstracts over the duplex byte stream a session
//! talks to: a QEMU serial socket, an accepted TCP connection, a serial
//! device, or the scripted mock from `nodem-test-harness`.
//!
//! The session loop reads one byte per call and writes echoes and responses
//! as soon as they are produced, so implementations must not buffer writes.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to the remote party.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the remote party.
    ///
    /// Implementations must write and flush all bytes before returning, so
    /// that an echoed byte is on the wire before the next read is serviced.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes into the provided buffer.
    ///
    /// Returns the number of bytes read (always at least one). Waits up to
    /// `timeout` and returns [`Error::Timeout`](crate::error::Error::Timeout)
    /// when nothing arrived. End-of-stream is reported as
    /// [`Error::ConnectionLost`](crate::error::Error::ConnectionLost).
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
