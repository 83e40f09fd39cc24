//! Command encoding and reply parsing for the MX180TP line protocol.
//!
//! Commands are short ASCII lines. Queries end in `?` and get exactly one
//! reply line; set commands get no reply at all.
//!
//! | Command | Reply |
//! |---------|-------|
//! | `*IDN?` | `THURLBY THANDAR, MX180TP, <serial>, <version>` |
//! | `V<n>?` / `I<n>?` | `V<n> <volts>` / `I<n> <amps>` (set point) |
//! | `V<n>O?` / `I<n>O?` | `<volts>V` / `<amps>A` (measured) |
//! | `OP<n>?` | `1` or `0` |
//! | `V<n> <v>`, `I<n> <a>`, `OP<n> <0/1>`, `OPALL <0/1>` | none |

use labrack_domain::channel::{ChannelState, PowerState};
use labrack_domain::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Identify,
    VoltageSetpoint(u8),
    SetVoltage(u8, f64),
    CurrentLimit(u8),
    SetCurrentLimit(u8, f64),
    OutputState(u8),
    SetOutput(u8, PowerState),
    OutputVoltage(u8),
    OutputCurrent(u8),
    SetAllOutputs(PowerState),
}

impl Command {
    /// Wire form, newline-terminated.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut line = match self {
            Self::Identify => "*IDN?".to_string(),
            Self::VoltageSetpoint(n) => format!("V{n}?"),
            Self::SetVoltage(n, volts) => format!("V{n} {volts}"),
            Self::CurrentLimit(n) => format!("I{n}?"),
            Self::SetCurrentLimit(n, amps) => format!("I{n} {amps}"),
            Self::OutputState(n) => format!("OP{n}?"),
            Self::SetOutput(n, state) => format!("OP{n} {}", state.as_flag()),
            Self::OutputVoltage(n) => format!("V{n}O?"),
            Self::OutputCurrent(n) => format!("I{n}O?"),
            Self::SetAllOutputs(state) => format!("OPALL {}", state.as_flag()),
        };
        line.push('\n');
        line
    }

    /// Whether the instrument answers this command.
    #[must_use]
    pub fn expects_reply(&self) -> bool {
        matches!(
            self,
            Self::Identify
                | Self::VoltageSetpoint(_)
                | Self::CurrentLimit(_)
                | Self::OutputState(_)
                | Self::OutputVoltage(_)
                | Self::OutputCurrent(_)
        )
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.encode().trim_end())
    }
}

/// Parse an `OP<n>?` reply.
///
/// # Errors
///
/// Returns [`ParseError::UnexpectedToken`] for anything but `0` or `1`.
pub fn parse_output_state(reply: &str) -> Result<ChannelState, ParseError> {
    match reply.trim() {
        "1" => Ok(ChannelState::On),
        "0" => Ok(ChannelState::Off),
        other => Err(ParseError::UnexpectedToken {
            token: other.to_string(),
        }),
    }
}

/// Parse a numeric reply: `V1 12.000`, `12.001V` and `0.100A` all work.
///
/// # Errors
///
/// Returns [`ParseError::UnexpectedToken`] when no number can be read.
pub fn parse_reading(reply: &str) -> Result<f64, ParseError> {
    let token = reply.split_whitespace().last().unwrap_or_default();
    token
        .trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .map_err(|_| ParseError::UnexpectedToken {
            token: reply.trim().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_encode_queries() {
        assert_eq!(Command::Identify.encode(), "*IDN?\n");
        assert_eq!(Command::OutputState(2).encode(), "OP2?\n");
        assert_eq!(Command::OutputVoltage(1).encode(), "V1O?\n");
        assert_eq!(Command::CurrentLimit(3).encode(), "I3?\n");
    }

    #[test]
    fn should_encode_set_commands() {
        assert_eq!(Command::SetOutput(1, PowerState::On).encode(), "OP1 1\n");
        assert_eq!(Command::SetAllOutputs(PowerState::Off).encode(), "OPALL 0\n");
        assert_eq!(Command::SetVoltage(2, 12.5).encode(), "V2 12.5\n");
        assert_eq!(Command::SetCurrentLimit(1, 0.25).encode(), "I1 0.25\n");
    }

    #[test]
    fn should_only_expect_replies_to_queries() {
        assert!(Command::OutputState(1).expects_reply());
        assert!(Command::Identify.expects_reply());
        assert!(!Command::SetOutput(1, PowerState::Off).expects_reply());
        assert!(!Command::SetAllOutputs(PowerState::On).expects_reply());
    }

    #[test]
    fn should_display_without_terminator() {
        assert_eq!(Command::OutputState(3).to_string(), "OP3?");
    }

    #[test]
    fn should_parse_output_state() {
        assert_eq!(parse_output_state("1\r\n"), Ok(ChannelState::On));
        assert_eq!(parse_output_state("0"), Ok(ChannelState::Off));
        assert!(parse_output_state("").is_err());
        assert!(parse_output_state("ON").is_err());
    }

    #[test]
    fn should_parse_readings_with_prefix_or_unit() {
        assert_eq!(parse_reading("V1 12.000\r\n"), Ok(12.0));
        assert_eq!(parse_reading("12.001V"), Ok(12.001));
        assert_eq!(parse_reading("0.100A\r\n"), Ok(0.1));
    }

    #[test]
    fn should_reject_non_numeric_reading() {
        assert!(parse_reading("ERR").is_err());
        assert!(parse_reading("").is_err());
    }
}
