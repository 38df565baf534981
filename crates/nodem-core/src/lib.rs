//! nodem-core: Core types, register bank, and error definitions for nodem.
//!
//! This crate holds the protocol-visible state of an emulated Hayes modem
//! and the byte-level transport abstraction that sessions run over. The
//! command language itself lives in `nodem-at`.
//!
//! # Key types
//!
//! - [`ModemState`] -- device settings plus the S-register bank
//! - [`RegisterBank`] -- framing bytes, timers, and the S95 bit field
//! - [`Transport`] -- byte-level communication channel
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod registers;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use nodem_core::*`.
pub use error::{Error, Result};
pub use registers::{DeviceSettings, ModemState, RegisterBank, ResultCodeOptions};
pub use transport::Transport;
pub use types::*;
