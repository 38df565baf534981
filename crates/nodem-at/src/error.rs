//! Command-channel error kinds.
//!
//! Each kind exists for local diagnostics only. On the wire every one of
//! them is reported as the same `ERROR` result code.

/// Why a command line was rejected.
///
/// Offsets are byte positions within the text that followed the `AT`
/// prefix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The line is shorter than a prefix.
    #[error("command line too short: {0:?}")]
    InvalidCommandLine(String),

    /// The line starts with neither `AT` nor `A/`.
    #[error("unknown command prefix: {0:?}")]
    UnknownCommandPrefix(String),

    /// No basic command is named by this character.
    #[error("unknown AT command {found:?} at offset {offset}")]
    UnknownAtCommand { offset: usize, found: char },

    /// `&` was followed by an unknown (or no) command character.
    #[error("unknown extended command at offset {offset}")]
    UnknownExtendedCommand { offset: usize },

    /// The command exists but its argument is missing or out of range.
    #[error("invalid argument for {command} at offset {offset}")]
    InvalidArgument { offset: usize, command: String },

    /// An S-register write lacks the `=` between index and value.
    #[error("expected '=' after S{register} at offset {offset}")]
    MissingSeparator { offset: usize, register: u32 },

    /// The S-register index is not implemented.
    #[error("unknown register S{0}")]
    UnknownRegister(u32),

    /// The command is recognised but deliberately not implemented.
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(&'static str),
}
