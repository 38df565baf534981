//! AT command grammar.
//!
//! [`execute`] interprets the text that follows the `AT` prefix of a command
//! line. Basic commands are a letter followed by a fixed-size argument and
//! may be chained without separators (`E0L1M2`); extended commands start
//! with `&`. A cursor walks the line left to right, and each command applies
//! its change to the [`ModemState`] as soon as it has been parsed.
//!
//! The first invalid command stops the walk. Changes made by the commands
//! before it stay applied; the rest of the line is ignored.
//!
//! | Command            | Effect                                            |
//! |--------------------|---------------------------------------------------|
//! | `&C<c>`, `&K<c>`   | accepted, not modelled                            |
//! | `&D<n>`            | accepted, not modelled                            |
//! | `&F`               | factory reset                                     |
//! | `E0`, `E1`         | echo off / on                                     |
//! | `L0`..`L3`         | speaker volume (`L0` and `L1` are both low)       |
//! | `M0`..`M3`         | speaker mode                                      |
//! | `N<c>`             | accepted, not modelled                            |
//! | `S<n>=<v>`         | write S0, S3, S4, S5, S7, or S95                  |
//! | `V<c>`             | accepted, except `V0` (numeric result codes)      |
//! | `X0`..`X4`         | carrier speed reporting off (`X0`) or on          |

use nodem_core::{ModemState, SpeakerMode, Volume};
use tracing::{debug, trace};

use crate::error::CommandError;

/// Parse the run of ASCII decimal digits at the start of `input`.
///
/// Returns the value and the number of digits consumed. Returns `None` when
/// `input` does not start with a digit or when the value does not fit in a
/// `u32`.
///
/// # Example
///
/// ```
/// use nodem_at::parser::parse_decimal;
///
/// assert_eq!(parse_decimal(b"95=13"), Some((95, 2)));
/// assert_eq!(parse_decimal(b"=13"), None);
/// ```
pub fn parse_decimal(input: &[u8]) -> Option<(u32, usize)> {
    let digits = input.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }

    let mut value: u32 = 0;
    for &digit in &input[..digits] {
        value = value.checked_mul(10)?.checked_add(u32::from(digit - b'0'))?;
    }
    Some((value, digits))
}

/// Execute every command in `commands` against `state`.
///
/// `commands` is a command line with its `AT` prefix already removed. An
/// empty string is a valid (empty) command line.
pub fn execute(commands: &str, state: &mut ModemState) -> Result<(), CommandError> {
    let mut cursor = Cursor::new(commands);

    while let Some(command) = cursor.advance() {
        let start = cursor.pos - 1;
        match command {
            b'&' => extended(&mut cursor, start, state)?,
            b'E' => {
                state.settings.echo = match cursor.argument("E", start)? {
                    b'0' => false,
                    b'1' => true,
                    _ => return Err(invalid("E", start)),
                };
                trace!(echo = state.settings.echo, "E");
            }
            b'L' => {
                state.settings.volume = match cursor.argument("L", start)? {
                    b'0' | b'1' => Volume::Low,
                    b'2' => Volume::Medium,
                    b'3' => Volume::High,
                    _ => return Err(invalid("L", start)),
                };
                trace!(volume = %state.settings.volume, "L");
            }
            b'M' => {
                state.settings.speaker_mode = match cursor.argument("M", start)? {
                    b'0' => SpeakerMode::AlwaysOff,
                    b'1' => SpeakerMode::OnUntilCarrierDetect,
                    b'2' => SpeakerMode::AlwaysOn,
                    b'3' => SpeakerMode::OnAfterDiallingUntilCarrierDetect,
                    _ => return Err(invalid("M", start)),
                };
                trace!(speaker_mode = %state.settings.speaker_mode, "M");
            }
            // Handshake options are not modelled.
            b'N' => {
                cursor.argument("N", start)?;
            }
            b'S' => write_register(&mut cursor, start, state)?,
            b'V' => {
                if cursor.argument("V", start)? == b'0' {
                    return Err(CommandError::UnsupportedFeature("numeric result codes"));
                }
            }
            b'X' => {
                let carrier_speed = match cursor.argument("X", start)? {
                    b'0' => false,
                    b'1'..=b'4' => true,
                    _ => return Err(invalid("X", start)),
                };
                state
                    .registers
                    .set_connect_with_carrier_speed(carrier_speed);
                trace!(carrier_speed, "X");
            }
            other => {
                return Err(CommandError::UnknownAtCommand {
                    offset: start,
                    found: char::from(other),
                });
            }
        }
    }

    Ok(())
}

/// `&` commands. `start` is the offset of the `&`.
fn extended(cursor: &mut Cursor<'_>, start: usize, state: &mut ModemState) -> Result<(), CommandError> {
    match cursor.advance() {
        Some(b'C') => {
            cursor.argument("&C", start)?;
        }
        Some(b'D') => {
            cursor.number("&D", start)?;
        }
        Some(b'F') => {
            state.factory_reset();
            debug!("factory reset");
        }
        Some(b'K') => {
            cursor.argument("&K", start)?;
        }
        _ => return Err(CommandError::UnknownExtendedCommand { offset: start }),
    }
    Ok(())
}

/// `S<index>=<value>`. `start` is the offset of the `S`.
fn write_register(
    cursor: &mut Cursor<'_>,
    start: usize,
    state: &mut ModemState,
) -> Result<(), CommandError> {
    let index = cursor.number("S", start)?;
    if !cursor.eat(b'=') {
        return Err(CommandError::MissingSeparator {
            offset: cursor.pos,
            register: index,
        });
    }
    let value = cursor.number("S", start)?;

    let regs = &mut state.registers;
    match index {
        0 => regs.set_ring_to_answer_after(value),
        3 => regs.set_end_of_line(register_byte(index, value, start)?),
        4 => regs.set_line_feed(register_byte(index, value, start)?),
        5 => regs.set_backspace(register_byte(index, value, start)?),
        7 => regs.set_wait_for_carrier_secs(value),
        95 => regs.set_result_code_bits(value),
        _ => return Err(CommandError::UnknownRegister(index)),
    }
    debug!(register = index, value, "register written");
    Ok(())
}

/// Character registers hold a single byte.
fn register_byte(index: u32, value: u32, start: usize) -> Result<u8, CommandError> {
    u8::try_from(value).map_err(|_| invalid(&format!("S{index}"), start))
}

fn invalid(command: &str, offset: usize) -> CommandError {
    CommandError::InvalidArgument {
        offset,
        command: command.to_string(),
    }
}

/// Read position within one command line.
struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Cursor {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn advance(&mut self) -> Option<u8> {
        let byte = *self.input.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    /// Consume `expected` if it is the next byte.
    fn eat(&mut self, expected: u8) -> bool {
        if self.input.get(self.pos) == Some(&expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// The single-character argument of `command`.
    fn argument(&mut self, command: &str, start: usize) -> Result<u8, CommandError> {
        self.advance().ok_or_else(|| invalid(command, start))
    }

    /// A decimal argument of `command`.
    fn number(&mut self, command: &str, start: usize) -> Result<u32, CommandError> {
        let (value, digits) =
            parse_decimal(&self.input[self.pos..]).ok_or_else(|| invalid(command, start))?;
        self.pos += digits;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodem_core::ResultCodeOptions;

    fn state() -> ModemState {
        ModemState::new(true)
    }

    fn run(commands: &str) -> (ModemState, Result<(), CommandError>) {
        let mut state = state();
        let result = execute(commands, &mut state);
        (state, result)
    }

    // ---------------------------------------------------------------
    // Decimal numbers
    // ---------------------------------------------------------------

    #[test]
    fn decimal_consumes_maximal_digit_run() {
        assert_eq!(parse_decimal(b"0"), Some((0, 1)));
        assert_eq!(parse_decimal(b"007x"), Some((7, 3)));
        assert_eq!(parse_decimal(b"1234567890"), Some((1_234_567_890, 10)));
    }

    #[test]
    fn decimal_requires_a_digit() {
        assert_eq!(parse_decimal(b""), None);
        assert_eq!(parse_decimal(b"x1"), None);
        assert_eq!(parse_decimal(b"-1"), None);
    }

    #[test]
    fn decimal_long_runs_are_exact() {
        assert_eq!(parse_decimal(b"4294967295"), Some((u32::MAX, 10)));
        assert_eq!(parse_decimal(b"999999999"), Some((999_999_999, 9)));
    }

    #[test]
    fn decimal_overflow_fails() {
        assert_eq!(parse_decimal(b"4294967296"), None);
        assert_eq!(parse_decimal(b"99999999999999999999"), None);
    }

    // ---------------------------------------------------------------
    // Basic commands
    // ---------------------------------------------------------------

    #[test]
    fn empty_line_succeeds() {
        let (state, result) = run("");
        assert!(result.is_ok());
        assert_eq!(state, self::state());
    }

    #[test]
    fn echo_off_and_on() {
        let (state, result) = run("E0");
        assert!(result.is_ok());
        assert!(!state.settings.echo);

        let mut state = state;
        execute("E1", &mut state).unwrap();
        assert!(state.settings.echo);
    }

    #[test]
    fn echo_bad_argument() {
        let (state, result) = run("E2");
        assert_eq!(
            result,
            Err(CommandError::InvalidArgument {
                offset: 0,
                command: "E".into()
            })
        );
        assert!(state.settings.echo);
    }

    #[test]
    fn command_letter_at_end_of_line_is_invalid() {
        for line in ["E", "L", "M", "N", "V", "X", "&C", "&K", "&D", "S"] {
            let (_, result) = run(line);
            assert!(
                matches!(result, Err(CommandError::InvalidArgument { .. })),
                "{line}: {result:?}"
            );
        }
    }

    #[test]
    fn volume_levels() {
        let cases = [
            ("L0", Volume::Low),
            ("L1", Volume::Low),
            ("L2", Volume::Medium),
            ("L3", Volume::High),
        ];
        for (line, expected) in cases {
            let (state, result) = run(line);
            assert!(result.is_ok());
            assert_eq!(state.settings.volume, expected, "{line}");
        }
        assert!(run("L4").1.is_err());
    }

    #[test]
    fn speaker_modes() {
        let cases = [
            ("M0", SpeakerMode::AlwaysOff),
            ("M1", SpeakerMode::OnUntilCarrierDetect),
            ("M2", SpeakerMode::AlwaysOn),
            ("M3", SpeakerMode::OnAfterDiallingUntilCarrierDetect),
        ];
        for (line, expected) in cases {
            let (state, result) = run(line);
            assert!(result.is_ok());
            assert_eq!(state.settings.speaker_mode, expected, "{line}");
        }
        assert!(run("M9").1.is_err());
    }

    #[test]
    fn handshake_option_is_a_no_op() {
        let (state, result) = run("N1");
        assert!(result.is_ok());
        assert_eq!(state, self::state());
    }

    #[test]
    fn numeric_result_codes_are_unsupported() {
        let (_, result) = run("V0");
        assert_eq!(
            result,
            Err(CommandError::UnsupportedFeature("numeric result codes"))
        );
        assert!(run("V1").1.is_ok());
    }

    #[test]
    fn dial_tone_detection_sets_carrier_speed() {
        for line in ["X1", "X2", "X3", "X4"] {
            let (state, result) = run(line);
            assert!(result.is_ok());
            assert!(state.registers.result_codes().connect_with_carrier_speed);
        }

        let mut state = state();
        execute("X4X0", &mut state).unwrap();
        assert!(!state.registers.result_codes().connect_with_carrier_speed);
        assert!(run("X5").1.is_err());
    }

    #[test]
    fn unknown_command_letter() {
        let (_, result) = run("Q9");
        assert_eq!(
            result,
            Err(CommandError::UnknownAtCommand {
                offset: 0,
                found: 'Q'
            })
        );
    }

    #[test]
    fn commands_are_case_sensitive() {
        assert!(matches!(
            run("e0").1,
            Err(CommandError::UnknownAtCommand { found: 'e', .. })
        ));
    }

    // ---------------------------------------------------------------
    // Extended commands
    // ---------------------------------------------------------------

    #[test]
    fn extended_placeholders() {
        for line in ["&C1", "&D2", "&D", "&K3"] {
            let (state, result) = run(line);
            if line == "&D" {
                assert!(result.is_err());
            } else {
                assert!(result.is_ok(), "{line}");
                assert_eq!(state, self::state());
            }
        }
    }

    #[test]
    fn extended_d_consumes_all_digits() {
        let (state, result) = run("&D123E0");
        assert!(result.is_ok());
        assert!(!state.settings.echo);
    }

    #[test]
    fn factory_reset_command() {
        let mut state = state();
        execute("L3M0S7=5S95=47", &mut state).unwrap();
        execute("&F", &mut state).unwrap();
        assert_eq!(state, ModemState::new(true));
    }

    #[test]
    fn factory_reset_chained_with_later_commands() {
        let mut state = state();
        execute("L3&FL2", &mut state).unwrap();
        assert_eq!(state.settings.volume, Volume::Medium);
    }

    #[test]
    fn unknown_extended_command() {
        assert_eq!(
            run("&Z").1,
            Err(CommandError::UnknownExtendedCommand { offset: 0 })
        );
        assert_eq!(
            run("E0&").1,
            Err(CommandError::UnknownExtendedCommand { offset: 2 })
        );
    }

    // ---------------------------------------------------------------
    // S-registers
    // ---------------------------------------------------------------

    #[test]
    fn write_numeric_registers() {
        let (state, result) = run("S0=2S7=45");
        assert!(result.is_ok());
        assert_eq!(state.registers.ring_to_answer_after(), 2);
        assert_eq!(state.registers.wait_for_carrier_secs(), 45);
    }

    #[test]
    fn write_character_registers() {
        let (state, result) = run("S3=59S4=33S5=127");
        assert!(result.is_ok());
        assert_eq!(state.registers.end_of_line(), b';');
        assert_eq!(state.registers.line_feed(), b'!');
        assert_eq!(state.registers.backspace(), 0x7F);
    }

    #[test]
    fn character_register_rejects_wide_values() {
        let (state, result) = run("S3=256");
        assert!(matches!(result, Err(CommandError::InvalidArgument { .. })));
        assert_eq!(state.registers.end_of_line(), 0x0D);
    }

    #[test]
    fn s95_bit_field_13() {
        let (state, result) = run("S95=13");
        assert!(result.is_ok());
        let opts = state.registers.result_codes();
        assert!(opts.connect_with_carrier_speed);
        assert!(!opts.connect_append_arq);
        assert!(opts.display_carrier);
        assert!(opts.display_protocol);
        assert!(!opts.display_compression);
    }

    #[test]
    fn s95_bit_field_32() {
        let (state, _) = run("S95=32");
        assert_eq!(
            state.registers.result_codes(),
            ResultCodeOptions {
                display_compression: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn register_missing_separator() {
        assert_eq!(
            run("S7?").1,
            Err(CommandError::MissingSeparator {
                offset: 2,
                register: 7
            })
        );
        assert_eq!(
            run("S7").1,
            Err(CommandError::MissingSeparator {
                offset: 2,
                register: 7
            })
        );
    }

    #[test]
    fn register_missing_index_or_value() {
        assert!(matches!(
            run("S=5").1,
            Err(CommandError::InvalidArgument { .. })
        ));
        assert!(matches!(
            run("S7=").1,
            Err(CommandError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn register_value_overflow() {
        assert!(matches!(
            run("S7=99999999999").1,
            Err(CommandError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn unknown_register() {
        assert_eq!(run("S1=1").1, Err(CommandError::UnknownRegister(1)));
        assert_eq!(run("S96=1").1, Err(CommandError::UnknownRegister(96)));
    }

    // ---------------------------------------------------------------
    // Chains and partial failure
    // ---------------------------------------------------------------

    #[test]
    fn chained_commands_apply_in_order() {
        let (state, result) = run("E0L1M2");
        assert!(result.is_ok());
        assert!(!state.settings.echo);
        assert_eq!(state.settings.volume, Volume::Low);
        assert_eq!(state.settings.speaker_mode, SpeakerMode::AlwaysOn);
    }

    #[test]
    fn failure_keeps_earlier_changes_and_skips_later_ones() {
        let (state, result) = run("E0Q9M2");
        assert_eq!(
            result,
            Err(CommandError::UnknownAtCommand {
                offset: 2,
                found: 'Q'
            })
        );
        assert!(!state.settings.echo);
        assert_eq!(
            state.settings.speaker_mode,
            SpeakerMode::OnAfterDiallingUntilCarrierDetect
        );
    }

    #[test]
    fn long_chain_is_not_recursive() {
        let line = "E0".repeat(50_000);
        let (state, result) = run(&line);
        assert!(result.is_ok());
        assert!(!state.settings.echo);
    }

    #[test]
    fn non_ascii_input_is_rejected() {
        assert!(matches!(
            run("É").1,
            Err(CommandError::UnknownAtCommand { offset: 0, .. })
        ));
    }
}
