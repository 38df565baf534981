//! Error types for nodem transports and sessions.
//!
//! Command-language failures are not represented here; they never leave the
//! command channel and are modelled by `nodem_at::CommandError`. This type
//! covers everything that can end or interrupt a session: the physical
//! transport, its end-of-stream signal, and read timeouts.

/// The error type for transport and session operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (socket path missing, serial port busy).
    #[error("transport error: {0}")]
    Transport(String),

    /// No data arrived within the read deadline.
    ///
    /// Sessions treat this as a poll tick rather than a failure.
    #[error("timeout waiting for data")]
    Timeout,

    /// The transport has been closed locally.
    #[error("not connected")]
    NotConnected,

    /// The peer closed the stream (end-of-stream) or the link dropped.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is the transport's end-of-stream signal.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Error::ConnectionLost)
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
