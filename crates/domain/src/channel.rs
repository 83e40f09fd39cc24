//! Channel: one switchable outlet on a power device.
//!
//! A device exposes a contiguous, device-specific range of channel indices
//! (e.g. `1..=4` on a socket strip, `1..=3` on a bench supply, `0..=1` on a
//! relay strip). Indices outside that range are rejected before any network
//! call is made.

mod state;

pub use state::{ChannelState, PowerState};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Inclusive range of valid channel indices on one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawChannelRange")]
pub struct ChannelRange {
    first: u8,
    last: u8,
}

#[derive(Deserialize)]
struct RawChannelRange {
    first: u8,
    last: u8,
}

impl TryFrom<RawChannelRange> for ChannelRange {
    type Error = ValidationError;

    fn try_from(raw: RawChannelRange) -> Result<Self, Self::Error> {
        Self::new(raw.first, raw.last)
    }
}

impl ChannelRange {
    /// Build a range, enforcing `first <= last`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidRange`] when `first > last`.
    pub fn new(first: u8, last: u8) -> Result<Self, ValidationError> {
        if first > last {
            return Err(ValidationError::InvalidRange { first, last });
        }
        Ok(Self { first, last })
    }

    /// Range fixed by a device family, for use in constants.
    ///
    /// # Panics
    ///
    /// Panics when `first > last`; in a `const` item this fails the build.
    #[must_use]
    pub const fn fixed(first: u8, last: u8) -> Self {
        assert!(first <= last, "inverted channel range");
        Self { first, last }
    }

    #[must_use]
    pub fn first(self) -> u8 {
        self.first
    }

    #[must_use]
    pub fn last(self) -> u8 {
        self.last
    }

    #[must_use]
    pub fn contains(self, channel: u8) -> bool {
        (self.first..=self.last).contains(&channel)
    }

    /// Number of channels in the range.
    #[must_use]
    pub fn len(self) -> usize {
        usize::from(self.last - self.first) + 1
    }

    /// A valid range always holds at least one channel.
    #[must_use]
    pub fn is_empty(self) -> bool {
        false
    }

    /// Iterate over every valid channel index in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        self.first..=self.last
    }

    /// Position of `channel` inside the range, if valid.
    #[must_use]
    pub fn offset(self, channel: u8) -> Option<usize> {
        self.contains(channel)
            .then(|| usize::from(channel - self.first))
    }

    /// Reject `channel` when it falls outside the range.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ChannelOutOfRange`].
    pub fn check(self, channel: u8) -> Result<(), ValidationError> {
        if self.contains(channel) {
            Ok(())
        } else {
            Err(ValidationError::ChannelOutOfRange {
                channel,
                first: self.first,
                last: self.last,
            })
        }
    }
}

impl std::fmt::Display for ChannelRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.first, self.last)
    }
}

/// One channel of one device together with its last observed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub device: String,
    pub index: u8,
    pub state: ChannelState,
}

impl Channel {
    /// A channel whose state has not been observed yet.
    #[must_use]
    pub fn unobserved(device: impl Into<String>, index: u8) -> Self {
        Self {
            device: device.into(),
            index,
            state: ChannelState::Unknown,
        }
    }
}

/// Which channels of a device a power step addresses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelSelection {
    /// Every channel in the device's valid range.
    #[default]
    All,
    /// Only the listed channels, in the listed order.
    Only(Vec<u8>),
}

impl std::fmt::Display for ChannelSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(channels) => {
                let list: Vec<String> = channels.iter().map(ToString::to_string).collect();
                f.write_str(&list.join(","))
            }
        }
    }
}
