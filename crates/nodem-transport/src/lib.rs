//! Transport implementations for nodem.
//!
//! This crate provides concrete implementations of the
//! [`Transport`](nodem_core::Transport) trait from `nodem-core`:
//!
//! - [`UnixTransport`]: Unix domain socket client (QEMU `-serial unix:...`)
//! - [`TcpTransport`]: dialled or accepted TCP connections
//! - [`SerialTransport`]: serial devices and pseudo-terminals
//!
//! # Example
//!
//! ```no_run
//! use nodem_transport::UnixTransport;
//! use nodem_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> nodem_core::Result<()> {
//! let mut transport = UnixTransport::connect("/tmp/nodem.sock").await?;
//! let mut byte = [0u8; 1];
//! let n = transport.receive(&mut byte, Duration::from_millis(250)).await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;
pub mod stream;
pub mod tcp;
#[cfg(unix)]
pub mod unix;

pub use serial::{DataBits, FlowControl, Parity, SerialConfig, SerialTransport, StopBits};
pub use stream::StreamTransport;
pub use tcp::TcpTransport;
#[cfg(unix)]
pub use unix::UnixTransport;
