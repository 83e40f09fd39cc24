//! Channel state: observed and desired on/off states of an outlet.

use serde::{Deserialize, Serialize};

/// State of a channel as last observed on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    On,
    Off,
    #[default]
    Unknown,
}

impl ChannelState {
    /// Whether the observed state equals the desired one.
    ///
    /// [`Unknown`](Self::Unknown) never matches.
    #[must_use]
    pub fn matches(self, desired: PowerState) -> bool {
        self == Self::from(desired)
    }

    /// Map a `0`/`1` device flag to a state.
    #[must_use]
    pub fn from_flag(flag: bool) -> Self {
        if flag { Self::On } else { Self::Off }
    }
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// State a channel is asked to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    /// The `0`/`1` flag used on the wire by every supported device family.
    #[must_use]
    pub fn as_flag(self) -> u8 {
        match self {
            Self::On => 1,
            Self::Off => 0,
        }
    }
}

impl From<PowerState> for ChannelState {
    fn from(state: PowerState) -> Self {
        match state {
            PowerState::On => Self::On,
            PowerState::Off => Self::Off,
        }
    }
}

impl std::fmt::Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        ChannelState::from(*self).fmt(f)
    }
}
