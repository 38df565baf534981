//! Command line framing.
//!
//! [`LineFramer`] collects command-mode bytes into lines. A line ends at the
//! S3 character; the S5 character deletes the previously buffered byte.
//! Echo is the session's job, not the framer's: every byte is echoed
//! exactly as received, whatever the framer does with it.
//!
//! A line longer than [`MAX_LINE`] is dropped whole: everything up to its
//! terminator is discarded and the terminator yields [`Frame::Overflow`].

use bytes::BytesMut;
use nodem_core::RegisterBank;
use tracing::warn;

/// Longest command line kept, in bytes. Longer lines are dropped.
pub const MAX_LINE: usize = 256;

/// What a terminator completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A command line, terminator removed and whitespace trimmed.
    Line(String),
    /// A line that exceeded [`MAX_LINE`] and was discarded.
    Overflow,
}

/// Accumulates command-mode bytes into command lines.
#[derive(Debug)]
pub struct LineFramer {
    buf: BytesMut,
    overflowed: bool,
}

impl LineFramer {
    pub fn new() -> Self {
        LineFramer {
            buf: BytesMut::with_capacity(MAX_LINE),
            overflowed: false,
        }
    }

    /// Feed one byte. Returns a frame when `byte` is the current
    /// end-of-line character.
    ///
    /// A returned line may be empty.
    pub fn push(&mut self, byte: u8, registers: &RegisterBank) -> Option<Frame> {
        if byte == registers.end_of_line() {
            let raw = self.buf.split();
            if self.overflowed {
                self.overflowed = false;
                return Some(Frame::Overflow);
            }
            return Some(Frame::Line(String::from_utf8_lossy(&raw).trim().to_string()));
        }

        if self.overflowed {
            return None;
        }

        if byte == registers.backspace() {
            self.buf.truncate(self.buf.len().saturating_sub(1));
            return None;
        }

        if self.buf.len() >= MAX_LINE {
            warn!(len = self.buf.len(), "command line too long, discarding");
            self.buf.clear();
            self.overflowed = true;
            return None;
        }
        self.buf.extend_from_slice(&[byte]);
        None
    }

    /// Bytes buffered for the line in progress.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    /// Whether the line in progress has already overflowed.
    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Drop the line in progress.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.overflowed = false;
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(framer: &mut LineFramer, regs: &RegisterBank, bytes: &[u8]) -> Vec<String> {
        bytes
            .iter()
            .filter_map(|&b| framer.push(b, regs))
            .map(|frame| match frame {
                Frame::Line(line) => line,
                Frame::Overflow => panic!("unexpected overflow"),
            })
            .collect()
    }

    #[test]
    fn line_ends_at_carriage_return() {
        let regs = RegisterBank::new();
        let mut framer = LineFramer::new();
        assert_eq!(feed(&mut framer, &regs, b"ATE0\r"), vec!["ATE0"]);
        assert!(framer.pending().is_empty());
    }

    #[test]
    fn no_line_without_terminator() {
        let regs = RegisterBank::new();
        let mut framer = LineFramer::new();
        assert!(feed(&mut framer, &regs, b"ATE0").is_empty());
        assert_eq!(framer.pending(), b"ATE0");
    }

    #[test]
    fn whitespace_is_trimmed() {
        let regs = RegisterBank::new();
        let mut framer = LineFramer::new();
        assert_eq!(feed(&mut framer, &regs, b"  AT \t\r"), vec!["AT"]);
    }

    #[test]
    fn line_feed_after_terminator_is_trimmed_from_next_line() {
        let regs = RegisterBank::new();
        let mut framer = LineFramer::new();
        assert_eq!(
            feed(&mut framer, &regs, b"ATE0\r\nATL2\r\n"),
            vec!["ATE0", "ATL2"]
        );
        assert_eq!(framer.pending(), b"\n");
    }

    #[test]
    fn empty_line() {
        let regs = RegisterBank::new();
        let mut framer = LineFramer::new();
        assert_eq!(feed(&mut framer, &regs, b"\r"), vec![String::new()]);
    }

    #[test]
    fn custom_terminator_is_not_part_of_line() {
        let mut regs = RegisterBank::new();
        regs.set_end_of_line(b';');
        let mut framer = LineFramer::new();
        assert_eq!(feed(&mut framer, &regs, b"ATL2;"), vec!["ATL2"]);
    }

    #[test]
    fn carriage_return_is_ordinary_after_terminator_change() {
        let mut regs = RegisterBank::new();
        regs.set_end_of_line(b';');
        let mut framer = LineFramer::new();
        assert!(feed(&mut framer, &regs, b"AT\r").is_empty());
        assert_eq!(feed(&mut framer, &regs, b";"), vec!["AT"]);
    }

    #[test]
    fn backspace_deletes_previous_byte() {
        let regs = RegisterBank::new();
        let mut framer = LineFramer::new();
        assert_eq!(feed(&mut framer, &regs, b"ATE1\x080\r"), vec!["ATE0"]);
    }

    #[test]
    fn backspace_on_empty_line_is_harmless() {
        let regs = RegisterBank::new();
        let mut framer = LineFramer::new();
        assert_eq!(feed(&mut framer, &regs, b"\x08\x08AT\r"), vec!["AT"]);
    }

    #[test]
    fn line_of_exactly_max_length_is_kept() {
        let regs = RegisterBank::new();
        let mut framer = LineFramer::new();
        let mut input = b"AT".to_vec();
        input.resize(MAX_LINE, b'N');
        assert!(feed(&mut framer, &regs, &input).is_empty());
        assert!(!framer.is_overflowed());
        let lines = feed(&mut framer, &regs, b"\r");
        assert_eq!(lines[0].len(), MAX_LINE);
    }

    #[test]
    fn overlong_line_is_dropped_through_its_terminator() {
        let regs = RegisterBank::new();
        let mut framer = LineFramer::new();
        let mut frames = Vec::new();
        for &b in [b'X'; MAX_LINE + 10].iter().chain(b"ATE0\r") {
            frames.extend(framer.push(b, &regs));
        }
        assert_eq!(frames, vec![Frame::Overflow]);
        assert!(framer.pending().is_empty());
        assert!(!framer.is_overflowed());

        // The next line is framed normally.
        assert_eq!(framer_line(&mut framer, &regs, b"ATL2\r"), Some("ATL2".to_string()));
    }

    #[test]
    fn backspace_does_not_recover_overflowed_line() {
        let regs = RegisterBank::new();
        let mut framer = LineFramer::new();
        for &b in [b'X'; MAX_LINE + 1].iter().chain(b"\x08\x08") {
            assert_eq!(framer.push(b, &regs), None);
        }
        assert!(framer.is_overflowed());
        assert_eq!(framer.push(b'\r', &regs), Some(Frame::Overflow));
    }

    #[test]
    fn clear_resets_overflow() {
        let regs = RegisterBank::new();
        let mut framer = LineFramer::new();
        for &b in &[b'X'; MAX_LINE + 1] {
            framer.push(b, &regs);
        }
        framer.clear();
        assert_eq!(framer_line(&mut framer, &regs, b"AT\r"), Some("AT".to_string()));
    }

    fn framer_line(framer: &mut LineFramer, regs: &RegisterBank, bytes: &[u8]) -> Option<String> {
        feed(framer, regs, bytes).into_iter().next()
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let regs = RegisterBank::new();
        let mut framer = LineFramer::new();
        let lines = feed(&mut framer, &regs, b"AT\xFF\r");
        assert_eq!(lines, vec!["AT\u{FFFD}"]);
    }
}
