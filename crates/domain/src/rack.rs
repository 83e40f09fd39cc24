//! Rack state: the single "rack powered" flag and the actions that flip it.

use serde::{Deserialize, Serialize};

/// Rack-level operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerAction {
    PowerOn,
    PowerOff,
}

impl PowerAction {
    /// State the rack is in once this action has run.
    #[must_use]
    pub fn resulting_state(self) -> RackState {
        match self {
            Self::PowerOn => RackState::Powered,
            Self::PowerOff => RackState::Unpowered,
        }
    }
}

impl std::fmt::Display for PowerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PowerOn => f.write_str("power_on"),
            Self::PowerOff => f.write_str("power_off"),
        }
    }
}

/// Whether the rack is considered powered.
///
/// The process starts in [`Powered`](Self::Powered): the first evening or
/// rest-day tick after startup therefore powers the rack off even if it was
/// never explicitly powered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RackState {
    #[default]
    Powered,
    Unpowered,
}

impl RackState {
    /// Power-off only runs while powered, power-on only while unpowered.
    #[must_use]
    pub fn accepts(self, action: PowerAction) -> bool {
        matches!(
            (self, action),
            (Self::Powered, PowerAction::PowerOff) | (Self::Unpowered, PowerAction::PowerOn)
        )
    }
}

impl std::fmt::Display for RackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Powered => f.write_str("powered"),
            Self::Unpowered => f.write_str("unpowered"),
        }
    }
}
