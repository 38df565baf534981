//! Wire-level constants and the response formatter.
//!
//! Command lines are ASCII, start with `AT` (or `A/` to repeat the last
//! command), and end with the S3 character. Responses are verbal result
//! codes wrapped in the live S3/S4 characters:
//!
//! ```text
//! <S3><S4>OK<S3><S4>
//! ```
//!
//! With factory registers that is the familiar `\r\nOK\r\n`. Changing S3 or
//! S4 changes the framing of the very next response.

use bytes::{BufMut, BytesMut};
use nodem_core::RegisterBank;

/// Prefix of every command line.
pub const ATTENTION_PREFIX: &str = "AT";

/// Prefix that re-executes the last accepted command line.
pub const REPEAT_PREFIX: &str = "A/";

/// A verbal result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Ok,
    Error,
}

impl Response {
    /// The text sent on the wire.
    pub fn text(&self) -> &'static str {
        match self {
            Response::Ok => "OK",
            Response::Error => "ERROR",
        }
    }
}

/// Encode a result code framed with the registers' current S3/S4 bytes.
///
/// # Example
///
/// ```
/// use nodem_at::protocol::{encode_response, Response};
/// use nodem_core::RegisterBank;
///
/// let regs = RegisterBank::new();
/// assert_eq!(encode_response(Response::Ok, &regs), b"\r\nOK\r\n");
/// ```
pub fn encode_response(response: Response, registers: &RegisterBank) -> Vec<u8> {
    let text = response.text().as_bytes();
    let mut buf = BytesMut::with_capacity(text.len() + 4);
    buf.put_u8(registers.end_of_line());
    buf.put_u8(registers.line_feed());
    buf.put_slice(text);
    buf.put_u8(registers.end_of_line());
    buf.put_u8(registers.line_feed());
    buf.to_vec()
}
