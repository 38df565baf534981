//! Scripted mock transport for testing modem sessions.
//!
//! [`MockTransport`] implements the [`Transport`] trait over an in-memory
//! input script. Bytes queued with [`feed`](MockTransport::feed) are handed
//! out by `receive()`; everything passed to `send()` is logged. When the
//! script runs dry the mock reports end-of-stream, or, after
//! [`hold_open`](MockTransport::hold_open), idles with read timeouts the way
//! a quiet but connected peer does.
//!
//! # Example
//!
//! ```
//! use nodem_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! mock.feed(b"ATE0\r");
//! assert_eq!(mock.pending_input(), 5);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

use nodem_core::error::{Error, Result};
use nodem_core::transport::Transport;

/// A mock [`Transport`] driven by a byte script.
#[derive(Debug)]
pub struct MockTransport {
    /// Bytes still to be delivered by `receive()`.
    input: VecDeque<u8>,
    /// Idle with timeouts instead of reporting end-of-stream once `input`
    /// is exhausted.
    hold_open: bool,
    /// Whether the transport is "connected".
    connected: bool,
    /// Log of all bytes sent through this transport, one entry per `send()`.
    sent_log: Vec<Vec<u8>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state with no input.
    pub fn new() -> Self {
        MockTransport {
            input: VecDeque::new(),
            hold_open: false,
            connected: true,
            sent_log: Vec::new(),
        }
    }

    /// Create a mock whose script is `input`.
    pub fn with_input(input: &[u8]) -> Self {
        let mut mock = Self::new();
        mock.feed(input);
        mock
    }

    /// Append bytes to the input script.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    /// Keep the stream open after the script is exhausted.
    pub fn hold_open(&mut self) {
        self.hold_open = true;
    }

    /// Number of scripted bytes not yet delivered.
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    /// All data that has been sent through this transport, one entry per
    /// `send()` call.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// All sent data concatenated into one byte string.
    pub fn sent_bytes(&self) -> Vec<u8> {
        self.sent_log.concat()
    }

    /// Forget everything sent so far.
    pub fn clear_sent(&mut self) {
        self.sent_log.clear();
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent `send()` and `receive()` calls will
    /// return [`Error::NotConnected`].
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        self.sent_log.push(data.to_vec());
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        if self.input.is_empty() {
            if self.hold_open {
                tokio::time::sleep(timeout).await;
                return Err(Error::Timeout);
            }
            return Err(Error::ConnectionLost);
        }

        let n = self.input.len().min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(self.input.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.input.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
