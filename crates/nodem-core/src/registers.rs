//! S-register bank and device settings.
//!
//! [`ModemState`] is the protocol-visible configuration of one session. It
//! is created in its factory state, mutated only by the AT command parser,
//! and read by the framer and response formatter for the live framing bytes.
//!
//! # Register map
//!
//! | Register | Field                 | Default |
//! |----------|-----------------------|---------|
//! | S0       | rings before answer   | 0       |
//! | S3       | end-of-line character | 0x0D    |
//! | S4       | line-feed character   | 0x0A    |
//! | S5       | backspace character   | 0x08    |
//! | S7       | wait for carrier (s)  | 60      |
//! | S95      | result code options   | 0       |

use crate::types::{SpeakerMode, Volume};

/// Default end-of-line character (carriage return).
pub const DEFAULT_END_OF_LINE: u8 = 0x0D;
/// Default line-feed character.
pub const DEFAULT_LINE_FEED: u8 = 0x0A;
/// Default backspace character.
pub const DEFAULT_BACKSPACE: u8 = 0x08;
/// Default carrier wait, in seconds.
pub const DEFAULT_WAIT_FOR_CARRIER_SECS: u32 = 60;

const BIT_CARRIER_SPEED: u32 = 1 << 0;
const BIT_APPEND_ARQ: u32 = 1 << 1;
const BIT_DISPLAY_CARRIER: u32 = 1 << 2;
const BIT_DISPLAY_PROTOCOL: u32 = 1 << 3;
// Bit 4 is unused.
const BIT_DISPLAY_COMPRESSION: u32 = 1 << 5;

/// Extended result code options held in S95.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultCodeOptions {
    /// Report the carrier speed rather than the DTE speed in `CONNECT`.
    pub connect_with_carrier_speed: bool,
    /// Append `/ARQ` to `CONNECT` when error control is active.
    pub connect_append_arq: bool,
    /// Emit a `CARRIER` result code.
    pub display_carrier: bool,
    /// Emit a `PROTOCOL` result code.
    pub display_protocol: bool,
    /// Emit a `COMPRESSION` result code.
    pub display_compression: bool,
}

impl ResultCodeOptions {
    /// Decode the S95 bit field. Unknown bits are ignored.
    pub fn from_bits(bits: u32) -> Self {
        ResultCodeOptions {
            connect_with_carrier_speed: bits & BIT_CARRIER_SPEED != 0,
            connect_append_arq: bits & BIT_APPEND_ARQ != 0,
            display_carrier: bits & BIT_DISPLAY_CARRIER != 0,
            display_protocol: bits & BIT_DISPLAY_PROTOCOL != 0,
            display_compression: bits & BIT_DISPLAY_COMPRESSION != 0,
        }
    }

    /// Encode back into the S95 bit field.
    pub fn bits(&self) -> u32 {
        let mut bits = 0;
        if self.connect_with_carrier_speed {
            bits |= BIT_CARRIER_SPEED;
        }
        if self.connect_append_arq {
            bits |= BIT_APPEND_ARQ;
        }
        if self.display_carrier {
            bits |= BIT_DISPLAY_CARRIER;
        }
        if self.display_protocol {
            bits |= BIT_DISPLAY_PROTOCOL;
        }
        if self.display_compression {
            bits |= BIT_DISPLAY_COMPRESSION;
        }
        bits
    }
}

/// The S-register bank.
///
/// Fields are private; all reads and writes go through the named accessors
/// so the framing bytes and the S95 bit layout cannot be bypassed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterBank {
    ring_to_answer_after: u32,
    end_of_line: u8,
    line_feed: u8,
    backspace: u8,
    wait_for_carrier_secs: u32,
    result_codes: ResultCodeOptions,
}

impl RegisterBank {
    /// Create a register bank holding the factory defaults.
    pub fn new() -> Self {
        RegisterBank {
            ring_to_answer_after: 0,
            end_of_line: DEFAULT_END_OF_LINE,
            line_feed: DEFAULT_LINE_FEED,
            backspace: DEFAULT_BACKSPACE,
            wait_for_carrier_secs: DEFAULT_WAIT_FOR_CARRIER_SECS,
            result_codes: ResultCodeOptions::default(),
        }
    }

    /// Restore every register to its factory default.
    pub fn factory_reset(&mut self) {
        *self = RegisterBank::new();
    }

    /// S0: number of rings before auto-answer (0 disables auto-answer).
    pub fn ring_to_answer_after(&self) -> u32 {
        self.ring_to_answer_after
    }

    pub fn set_ring_to_answer_after(&mut self, rings: u32) {
        self.ring_to_answer_after = rings;
    }

    /// S3: the byte that terminates command lines and wraps responses.
    pub fn end_of_line(&self) -> u8 {
        self.end_of_line
    }

    pub fn set_end_of_line(&mut self, byte: u8) {
        self.end_of_line = byte;
    }

    /// S4: the byte that follows end-of-line in responses.
    pub fn line_feed(&self) -> u8 {
        self.line_feed
    }

    pub fn set_line_feed(&mut self, byte: u8) {
        self.line_feed = byte;
    }

    /// S5: the byte that deletes the previous character of a command line.
    pub fn backspace(&self) -> u8 {
        self.backspace
    }

    pub fn set_backspace(&mut self, byte: u8) {
        self.backspace = byte;
    }

    /// S7: seconds to wait for a carrier after dialling.
    pub fn wait_for_carrier_secs(&self) -> u32 {
        self.wait_for_carrier_secs
    }

    pub fn set_wait_for_carrier_secs(&mut self, secs: u32) {
        self.wait_for_carrier_secs = secs;
    }

    /// S95: extended result code options.
    pub fn result_codes(&self) -> ResultCodeOptions {
        self.result_codes
    }

    /// Replace all S95 options from a raw bit field value.
    pub fn set_result_code_bits(&mut self, bits: u32) {
        self.result_codes = ResultCodeOptions::from_bits(bits);
    }

    /// Set only the "connect with carrier speed" option (also driven by `ATX`).
    pub fn set_connect_with_carrier_speed(&mut self, enabled: bool) {
        self.result_codes.connect_with_carrier_speed = enabled;
    }
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}

/// Device settings that are not S-registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSettings {
    /// Command-mode echo (`ATE`).
    pub echo: bool,
    /// Speaker volume (`ATL`).
    pub volume: Volume,
    /// Speaker control (`ATM`).
    pub speaker_mode: SpeakerMode,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        DeviceSettings {
            echo: true,
            volume: Volume::Low,
            speaker_mode: SpeakerMode::OnAfterDiallingUntilCarrierDetect,
        }
    }
}

/// The complete mutable configuration of one emulated modem.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModemState {
    pub settings: DeviceSettings,
    pub registers: RegisterBank,
}

impl ModemState {
    /// Create a modem in its factory state with the given echo setting.
    pub fn new(echo: bool) -> Self {
        let mut state = ModemState::default();
        state.settings.echo = echo;
        state.factory_reset();
        state
    }

    /// `AT&F`: restore volume, speaker mode, and all registers.
    ///
    /// Echo is left as it was.
    pub fn factory_reset(&mut self) {
        self.settings.volume = Volume::Low;
        self.settings.speaker_mode = SpeakerMode::OnAfterDiallingUntilCarrierDetect;
        self.registers.factory_reset();
    }
}
