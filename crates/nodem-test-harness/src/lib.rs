//! nodem-test-harness: Test utilities for nodem.
//!
//! This crate provides [`MockTransport`], a scripted transport that plays
//! back bytes "typed" by the remote party and records everything the modem
//! writes, for deterministic tests of the session loop without sockets.

pub mod mock_serial;

pub use mock_serial::MockTransport;
