//! Device facade: whole-device and single-channel on/off for one device.
//!
//! Every channel operation goes through [`ConfirmedSwitch`]. Whole-device
//! operations walk the channel range in order and keep going when a channel
//! fails: partial success is acceptable and each failure is logged on its
//! own. Only an unreachable device stops the walk, since every remaining
//! channel would wait out the same timeouts.

use labrack_domain::channel::{Channel, ChannelSelection, ChannelState, PowerState};
use labrack_domain::error::LabRackError;

use crate::ports::{ChannelAdapter, SwitchableDevice};
use crate::switch::{ConfirmedSwitch, RetryPolicy, SwitchOutcome};

/// Per-channel results of a whole-device or multi-channel operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceReport {
    pub device: String,
    pub target: PowerState,
    /// Channels observed in the target state.
    pub confirmed: Vec<u8>,
    /// Channels that did not converge or were rejected.
    pub failed: Vec<u8>,
}

impl DeviceReport {
    fn new(device: &str, target: PowerState) -> Self {
        Self {
            device: device.to_string(),
            target,
            confirmed: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Every addressed channel reached the target state.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// One physical device: its adapter, retry policy and observed channel states.
pub struct Device<A> {
    adapter: A,
    switch: ConfirmedSwitch,
    channels: Vec<Channel>,
}

impl<A: ChannelAdapter> Device<A> {
    /// Wrap `adapter`; every channel starts [`ChannelState::Unknown`].
    pub fn new(adapter: A, policy: RetryPolicy) -> Self {
        let channels = adapter
            .channels()
            .iter()
            .map(|index| Channel::unobserved(adapter.device_name(), index))
            .collect();
        Self {
            adapter,
            switch: ConfirmedSwitch::new(policy),
            channels,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.adapter.device_name()
    }

    /// Channels with the state observed by the last switch on each.
    #[must_use]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    #[must_use]
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Direct access for device-specific commands outside the on/off model.
    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    /// Turn one channel on, verifying it or retrying.
    ///
    /// # Errors
    ///
    /// Returns [`LabRackError::Validation`] for a channel outside the
    /// device's range and [`LabRackError::Connectivity`] when the device is
    /// unreachable.
    pub async fn turn_on_channel(&mut self, channel: u8) -> Result<SwitchOutcome, LabRackError> {
        self.switch_channel(channel, PowerState::On).await
    }

    /// Turn one channel off, verifying it or retrying.
    ///
    /// # Errors
    ///
    /// Same as [`turn_on_channel`](Self::turn_on_channel).
    pub async fn turn_off_channel(&mut self, channel: u8) -> Result<SwitchOutcome, LabRackError> {
        self.switch_channel(channel, PowerState::Off).await
    }

    /// Turn every channel on.
    ///
    /// # Errors
    ///
    /// Returns [`LabRackError::Connectivity`] when the device is unreachable.
    pub async fn all_on(&mut self) -> Result<DeviceReport, LabRackError> {
        let channels: Vec<u8> = self.adapter.channels().iter().collect();
        self.switch_channels(&channels, PowerState::On).await
    }

    /// Turn every channel off.
    ///
    /// # Errors
    ///
    /// Returns [`LabRackError::Connectivity`] when the device is unreachable.
    pub async fn all_off(&mut self) -> Result<DeviceReport, LabRackError> {
        let channels: Vec<u8> = self.adapter.channels().iter().collect();
        self.switch_channels(&channels, PowerState::Off).await
    }

    /// Switch `channels` in order, continuing past individual failures.
    ///
    /// # Errors
    ///
    /// Returns [`LabRackError::Connectivity`] when the device is unreachable;
    /// the remaining channels are not attempted.
    #[tracing::instrument(skip(self), fields(device = %self.adapter.device_name()))]
    pub async fn switch_channels(
        &mut self,
        channels: &[u8],
        target: PowerState,
    ) -> Result<DeviceReport, LabRackError> {
        let mut report = DeviceReport::new(self.adapter.device_name(), target);

        for &channel in channels {
            match self.switch_channel(channel, target).await {
                Ok(outcome) if outcome.is_confirmed() => report.confirmed.push(channel),
                Ok(_) => report.failed.push(channel),
                Err(err) if err.is_connectivity() => {
                    tracing::error!(
                        device = self.adapter.device_name(),
                        channel,
                        error = %err,
                        "device unreachable, skipping remaining channels"
                    );
                    return Err(err);
                }
                Err(err) => {
                    tracing::error!(
                        device = self.adapter.device_name(),
                        channel,
                        error = %err,
                        "could not switch channel"
                    );
                    report.failed.push(channel);
                }
            }
        }

        Ok(report)
    }

    async fn switch_channel(
        &mut self,
        channel: u8,
        target: PowerState,
    ) -> Result<SwitchOutcome, LabRackError> {
        match self.switch.apply(&mut self.adapter, channel, target).await {
            Ok(outcome) => {
                self.record(channel, outcome.observed(target));
                Ok(outcome)
            }
            Err(err) => {
                if err.is_connectivity() {
                    self.record(channel, ChannelState::Unknown);
                }
                Err(err)
            }
        }
    }

    fn record(&mut self, channel: u8, state: ChannelState) {
        if let Some(slot) = self.channels.iter_mut().find(|c| c.index == channel) {
            slot.state = state;
        }
    }
}

impl<A: ChannelAdapter> SwitchableDevice for Device<A> {
    fn name(&self) -> &str {
        self.adapter.device_name()
    }

    async fn switch(
        &mut self,
        selection: &ChannelSelection,
        target: PowerState,
    ) -> Result<DeviceReport, LabRackError> {
        match selection {
            ChannelSelection::All => match target {
                PowerState::On => self.all_on().await,
                PowerState::Off => self.all_off().await,
            },
            ChannelSelection::Only(channels) => self.switch_channels(channels, target).await,
        }
    }
}
