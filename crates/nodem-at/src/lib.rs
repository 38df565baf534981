//! Hayes AT command channel for nodem.
//!
//! This crate turns a byte stream into an emulated Hayes modem's command
//! channel:
//!
//! - [`framer`] -- splits command-mode bytes into lines on the S3 character
//! - [`dispatcher`] -- checks the `AT` / `A/` prefix and remembers the last
//!   accepted line
//! - [`parser`] -- executes chained basic, `&`, and S-register commands
//! - [`protocol`] -- prefixes and the `OK` / `ERROR` response formatter
//! - [`session`] -- the per-connection loop tying these to a
//!   [`Transport`](nodem_core::Transport)
//!
//! # Example
//!
//! ```
//! use nodem_at::dispatcher::CommandDispatcher;
//! use nodem_at::protocol::{encode_response, Response};
//! use nodem_core::{ModemState, SpeakerMode};
//!
//! let mut state = ModemState::new(true);
//! let mut dispatcher = CommandDispatcher::new();
//!
//! let response = match dispatcher.dispatch("ATE0L1M2", &mut state) {
//!     Ok(()) => Response::Ok,
//!     Err(_) => Response::Error,
//! };
//! assert_eq!(encode_response(response, &state.registers), b"\r\nOK\r\n");
//! assert_eq!(state.settings.speaker_mode, SpeakerMode::AlwaysOn);
//! ```

pub mod dispatcher;
pub mod error;
pub mod framer;
pub mod parser;
pub mod protocol;
pub mod session;

pub use dispatcher::CommandDispatcher;
pub use error::CommandError;
pub use framer::{Frame, LineFramer};
pub use protocol::Response;
pub use session::{
    DataRelay, DiscardRelay, ModemSession, SessionBuilder, SessionExit, SessionHandle,
    spawn_session,
};
