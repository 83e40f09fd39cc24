//! Power plan: the ordered device steps behind "power on the rack" and
//! "power off the rack".
//!
//! Ordering is part of the operational contract: some equipment must only be
//! powered once the equipment it depends on is up, and the other way round
//! when shutting down.

use serde::Deserialize;

use crate::channel::ChannelSelection;
use crate::error::ValidationError;

/// One step of a plan: switch some channels of one device.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawPowerStep")]
pub struct PowerStep {
    pub device: String,
    pub channels: ChannelSelection,
}

#[derive(Deserialize)]
struct RawPowerStep {
    device: String,
    #[serde(default)]
    channels: Option<Vec<u8>>,
}

impl From<RawPowerStep> for PowerStep {
    fn from(raw: RawPowerStep) -> Self {
        Self {
            device: raw.device,
            channels: raw
                .channels
                .map_or(ChannelSelection::All, ChannelSelection::Only),
        }
    }
}

impl PowerStep {
    /// Switch every channel of `device`.
    #[must_use]
    pub fn all(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            channels: ChannelSelection::All,
        }
    }

    /// Switch only `channels` of `device`, in order.
    #[must_use]
    pub fn only(device: impl Into<String>, channels: impl Into<Vec<u8>>) -> Self {
        Self {
            device: device.into(),
            channels: ChannelSelection::Only(channels.into()),
        }
    }
}

/// Ordered step lists for both rack operations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct PowerPlan {
    pub power_on: Vec<PowerStep>,
    pub power_off: Vec<PowerStep>,
}

impl PowerPlan {
    /// Check that every step references one of `known` devices.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownDevice`] for the first step naming
    /// a device that is not configured.
    pub fn check_devices<'a>(
        &self,
        known: impl IntoIterator<Item = &'a str> + Clone,
    ) -> Result<(), ValidationError> {
        for step in self.power_on.iter().chain(&self.power_off) {
            if !known.clone().into_iter().any(|name| name == step.device) {
                return Err(ValidationError::UnknownDevice(step.device.clone()));
            }
        }
        Ok(())
    }
}
