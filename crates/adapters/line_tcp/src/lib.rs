//! # labrack-adapter-line-tcp
//!
//! Bench supply adapter for TTi MX180TP-style triple-output supplies,
//! driven through their line-oriented TCP command protocol (port 9221).
//!
//! ## Responsibilities
//! - Keep one persistent connection per supply, reopened after failures
//! - Encode the full command set: identity, set points, measured outputs,
//!   per-output and all-output switching
//! - Implement [`ChannelAdapter`] for outputs `1..=3`; a state query that
//!   times out reads as [`ChannelState::Unknown`]
//!
//! ## Dependency rule
//! Depends on `labrack-app` and `labrack-domain`.

pub mod config;
pub mod error;
pub mod protocol;

mod connection;

use std::time::Duration;

use labrack_app::ports::ChannelAdapter;
use labrack_domain::channel::{ChannelRange, ChannelState, PowerState};
use labrack_domain::endpoint::DeviceEndpoint;
use labrack_domain::error::{LabRackError, ValidationError};

pub use config::LineTcpConfig;
pub use error::LineTcpError;
pub use protocol::Command;

use crate::connection::LineConnection;

/// Outputs of an MX180TP.
pub const CHANNELS: ChannelRange = ChannelRange::fixed(1, 3);

/// Readings of one output.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputStatus {
    pub channel: u8,
    pub state: ChannelState,
    /// Measured volts.
    pub voltage: f64,
    /// Measured amps.
    pub current: f64,
}

/// Identity plus every output's readings.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplyStatus {
    pub identity: String,
    pub outputs: Vec<OutputStatus>,
}

impl std::fmt::Display for SupplyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Name: {}", self.identity)?;
        for output in &self.outputs {
            write!(
                f,
                "\n  CH{}\tstate: {},\tV: {:.3},\tI: {:.3}",
                output.channel, output.state, output.voltage, output.current
            )?;
        }
        Ok(())
    }
}

/// One line-protocol bench supply.
pub struct Mx180tp {
    endpoint: DeviceEndpoint,
    connection: LineConnection,
    settle: Duration,
}

impl Mx180tp {
    /// Build the adapter. The connection is opened on first use.
    #[must_use]
    pub fn new(endpoint: DeviceEndpoint, config: &LineTcpConfig) -> Self {
        Self {
            connection: LineConnection::new(endpoint.socket_addr(), config.timeout()),
            settle: config.settle(),
            endpoint,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &DeviceEndpoint {
        &self.endpoint
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_open()
    }

    /// `*IDN?`: manufacturer, model, serial number and firmware version.
    ///
    /// # Errors
    ///
    /// Returns a [`LineTcpError`] when the instrument is unreachable or silent.
    pub async fn identify(&mut self) -> Result<String, LineTcpError> {
        self.connection.exchange(Command::Identify).await
    }

    /// # Errors
    ///
    /// Returns [`LineTcpError::Validation`] for an output outside `1..=3`,
    /// [`LineTcpError::Reply`] for a reply other than `0`/`1`, and a
    /// transport error otherwise.
    pub async fn output_state(&mut self, channel: u8) -> Result<ChannelState, LineTcpError> {
        CHANNELS.check(channel)?;
        let reply = self.connection.exchange(Command::OutputState(channel)).await?;
        protocol::parse_output_state(&reply).map_err(|err| {
            tracing::error!(device = self.endpoint.name(), channel, %reply, "unexpected output state");
            err.into()
        })
    }

    /// Set voltage of one output, in volts.
    ///
    /// # Errors
    ///
    /// Same as [`output_state`](Self::output_state).
    pub async fn voltage_setpoint(&mut self, channel: u8) -> Result<f64, LineTcpError> {
        self.reading(Command::VoltageSetpoint(channel), channel).await
    }

    /// Current limit of one output, in amps.
    ///
    /// # Errors
    ///
    /// Same as [`output_state`](Self::output_state).
    pub async fn current_limit(&mut self, channel: u8) -> Result<f64, LineTcpError> {
        self.reading(Command::CurrentLimit(channel), channel).await
    }

    /// Measured output voltage, in volts.
    ///
    /// # Errors
    ///
    /// Same as [`output_state`](Self::output_state).
    pub async fn output_voltage(&mut self, channel: u8) -> Result<f64, LineTcpError> {
        self.reading(Command::OutputVoltage(channel), channel).await
    }

    /// Measured output current, in amps.
    ///
    /// # Errors
    ///
    /// Same as [`output_state`](Self::output_state).
    pub async fn output_current(&mut self, channel: u8) -> Result<f64, LineTcpError> {
        self.reading(Command::OutputCurrent(channel), channel).await
    }

    /// Switch one output. The instrument does not acknowledge.
    ///
    /// # Errors
    ///
    /// Returns [`LineTcpError::Validation`] for an output outside `1..=3`
    /// and a transport error when the command cannot be sent.
    pub async fn set_output(&mut self, channel: u8, state: PowerState) -> Result<(), LineTcpError> {
        CHANNELS.check(channel)?;
        self.set(Command::SetOutput(channel, state)).await
    }

    /// Switch every output at once.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the command cannot be sent.
    pub async fn set_all_outputs(&mut self, state: PowerState) -> Result<(), LineTcpError> {
        self.set(Command::SetAllOutputs(state)).await
    }

    /// # Errors
    ///
    /// Returns [`LineTcpError::Validation`] for an output outside `1..=3`
    /// or a negative or non-finite value, and a transport error when the
    /// command cannot be sent.
    pub async fn set_voltage(&mut self, channel: u8, volts: f64) -> Result<(), LineTcpError> {
        CHANNELS.check(channel)?;
        check_setpoint(volts)?;
        self.set(Command::SetVoltage(channel, volts)).await
    }

    /// # Errors
    ///
    /// Same as [`set_voltage`](Self::set_voltage).
    pub async fn set_current_limit(&mut self, channel: u8, amps: f64) -> Result<(), LineTcpError> {
        CHANNELS.check(channel)?;
        check_setpoint(amps)?;
        self.set(Command::SetCurrentLimit(channel, amps)).await
    }

    /// Identity plus state, measured voltage and current of every output.
    ///
    /// # Errors
    ///
    /// Returns the first error met while querying.
    #[tracing::instrument(skip(self), fields(device = %self.endpoint.name()))]
    pub async fn status(&mut self) -> Result<SupplyStatus, LineTcpError> {
        let identity = self.identify().await?;
        let mut outputs = Vec::with_capacity(CHANNELS.len());
        for channel in CHANNELS.iter() {
            outputs.push(OutputStatus {
                channel,
                state: self.output_state(channel).await?,
                voltage: self.output_voltage(channel).await?,
                current: self.output_current(channel).await?,
            });
        }
        Ok(SupplyStatus { identity, outputs })
    }

    async fn reading(&mut self, command: Command, channel: u8) -> Result<f64, LineTcpError> {
        CHANNELS.check(channel)?;
        let reply = self.connection.exchange(command).await?;
        protocol::parse_reading(&reply).map_err(|err| {
            tracing::error!(device = self.endpoint.name(), %command, %reply, "unexpected reading");
            err.into()
        })
    }

    async fn set(&mut self, command: Command) -> Result<(), LineTcpError> {
        self.connection.exchange(command).await?;
        tracing::debug!(device = self.endpoint.name(), %command, "sent");
        tokio::time::sleep(self.settle).await;
        Ok(())
    }
}

fn check_setpoint(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidSetpoint(value.to_string()))
    }
}

impl ChannelAdapter for Mx180tp {
    fn device_name(&self) -> &str {
        self.endpoint.name()
    }

    fn channels(&self) -> ChannelRange {
        CHANNELS
    }

    async fn read_state(&mut self, channel: u8) -> Result<ChannelState, LabRackError> {
        match self.output_state(channel).await {
            Ok(state) => Ok(state),
            Err(err) if err.is_timeout() => {
                tracing::warn!(
                    device = self.endpoint.name(),
                    channel,
                    "no reply to output state query"
                );
                Ok(ChannelState::Unknown)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn write_state(&mut self, channel: u8, desired: PowerState) -> Result<(), LabRackError> {
        Ok(self.set_output(channel, desired).await?)
    }
}
