//! Command line dispatch.
//!
//! [`CommandDispatcher`] receives complete, trimmed command lines from the
//! framer, checks their prefix, and hands the command text to the parser.
//! It also remembers the last line that executed successfully so that `A/`
//! can run it again.

use nodem_core::ModemState;
use tracing::debug;

use crate::error::CommandError;
use crate::parser;
use crate::protocol::{ATTENTION_PREFIX, REPEAT_PREFIX};

/// Routes command lines to the parser and tracks the last accepted line.
#[derive(Debug, Default)]
pub struct CommandDispatcher {
    last_command: Option<String>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last line accepted with an `AT` prefix, if any.
    pub fn last_command(&self) -> Option<&str> {
        self.last_command.as_deref()
    }

    /// Execute one command line against `state`.
    ///
    /// - `AT...` runs the text after the prefix; on success the whole line
    ///   is remembered for `A/`.
    /// - `A/` runs the remembered line again, prefix stripped the same way.
    ///   With nothing remembered it behaves like a bare `AT`.
    /// - Anything else, and any line shorter than two characters, is
    ///   rejected.
    pub fn dispatch(&mut self, line: &str, state: &mut ModemState) -> Result<(), CommandError> {
        if line.chars().count() < 2 {
            return Err(CommandError::InvalidCommandLine(line.to_string()));
        }

        if let Some(commands) = line.strip_prefix(ATTENTION_PREFIX) {
            debug!(line, "executing command line");
            parser::execute(commands, state)?;
            self.last_command = Some(line.to_string());
            return Ok(());
        }

        if line.starts_with(REPEAT_PREFIX) {
            let previous = self.last_command.as_deref().unwrap_or(ATTENTION_PREFIX);
            debug!(line = previous, "repeating last command line");
            let commands = previous.strip_prefix(ATTENTION_PREFIX).unwrap_or(previous);
            return parser::execute(commands, state);
        }

        Err(CommandError::UnknownCommandPrefix(line.to_string()))
    }
}
