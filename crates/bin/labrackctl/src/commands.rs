//! Command execution: one connection to one device, results on stdout.

use std::io::Write;

use labrack_adapter_digest_http::{DigestHttpConfig, DigestHttpError, WebLine};
use labrack_adapter_line_tcp::{LineTcpConfig, LineTcpError, Mx180tp};
use labrack_adapter_scrape_http::{Egpm2, ScrapeHttpConfig, ScrapeHttpError};
use labrack_app::device::{Device, DeviceReport};
use labrack_app::ports::ChannelAdapter;
use labrack_app::switch::{RetryPolicy, SwitchOutcome};
use labrack_domain::channel::PowerState;
use labrack_domain::endpoint::{Credentials, DeviceEndpoint, ProtocolKind};
use labrack_domain::error::{LabRackError, ValidationError};

use crate::cli::{DeviceCommand, SupplyAction, SwitchAction, Target};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Missing arguments")]
    MissingArguments,
    #[error(transparent)]
    Device(#[from] LabRackError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Strip(#[from] ScrapeHttpError),
    #[error(transparent)]
    Relay(#[from] DigestHttpError),
    #[error(transparent)]
    Supply(#[from] LineTcpError),
    #[error("failed to write output")]
    Output(#[from] std::io::Error),
}

/// Run `command`, writing human-readable results to `out`.
///
/// # Errors
///
/// Returns [`CliError::MissingArguments`] before touching the network when
/// the action (or a value it needs) is absent, otherwise the first device
/// error.
pub async fn run(command: DeviceCommand, out: &mut impl Write) -> Result<(), CliError> {
    let policy = RetryPolicy::default();
    match command {
        DeviceCommand::Strip {
            target,
            password,
            action,
            channel,
        } => {
            let action = action.ok_or(CliError::MissingArguments)?;
            let endpoint = endpoint(
                "strip",
                &target,
                ProtocolKind::ScrapeHttp,
                Some(Credentials::new("", password)),
            )?;
            let mut strip = Egpm2::new(endpoint, &ScrapeHttpConfig::default())?;
            if action == SwitchAction::Status {
                writeln!(out, "{}", strip.status().await?)?;
                return Ok(());
            }
            switch(&mut Device::new(strip, policy), action, channel, out).await
        }
        DeviceCommand::Relay {
            target,
            user,
            password,
            action,
            relay,
        } => {
            let action = action.ok_or(CliError::MissingArguments)?;
            let endpoint = endpoint(
                "relay",
                &target,
                ProtocolKind::DigestHttp,
                Some(Credentials::new(user, password)),
            )?;
            let mut strip = WebLine::new(endpoint, &DigestHttpConfig::default())?;
            if action == SwitchAction::Status {
                let relays = match relay {
                    Some(relay) => vec![relay],
                    None => strip.channels().iter().collect(),
                };
                for relay in relays {
                    writeln!(out, "relay {relay}: {}", strip.relay_state(relay).await?)?;
                }
                return Ok(());
            }
            switch(&mut Device::new(strip, policy), action, relay, out).await
        }
        DeviceCommand::Supply {
            target,
            action,
            channel,
            value,
        } => {
            let action = action.ok_or(CliError::MissingArguments)?;
            let endpoint = endpoint("supply", &target, ProtocolKind::LineTcp, None)?;
            let mut supply = Mx180tp::new(endpoint, &LineTcpConfig::default());
            match (action, channel) {
                (SupplyAction::Status, _) => writeln!(out, "{}", supply.status().await?)?,
                (SupplyAction::SetVoltage, Some(channel)) => {
                    let volts = value.ok_or(CliError::MissingArguments)?;
                    supply.set_voltage(channel, volts).await?;
                    let setpoint = supply.voltage_setpoint(channel).await?;
                    writeln!(out, "CH{channel} voltage set to {setpoint:.3} V")?;
                }
                (SupplyAction::SetVoltage, None) => return Err(CliError::MissingArguments),
                (SupplyAction::On | SupplyAction::Off, None) => {
                    let state = power_state(action == SupplyAction::On);
                    supply.set_all_outputs(state).await?;
                    writeln!(out, "all outputs {state}")?;
                }
                (SupplyAction::On | SupplyAction::Off, Some(channel)) => {
                    let action = if action == SupplyAction::On {
                        SwitchAction::On
                    } else {
                        SwitchAction::Off
                    };
                    switch(&mut Device::new(supply, policy), action, Some(channel), out).await?;
                }
            }
            Ok(())
        }
    }
}

/// Process exit status for the outcome of [`run`]: `0` on success, `1` for
/// any error, device errors included.
#[must_use]
pub fn exit_status(result: &Result<(), CliError>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

fn endpoint(
    name: &str,
    target: &Target,
    protocol: ProtocolKind,
    credentials: Option<Credentials>,
) -> Result<DeviceEndpoint, ValidationError> {
    DeviceEndpoint::new(
        name,
        &target.ip,
        target.port.unwrap_or_else(|| protocol.default_port()),
        protocol,
        credentials,
    )
}

fn power_state(on: bool) -> PowerState {
    if on { PowerState::On } else { PowerState::Off }
}

/// Confirmed switch of one channel, or of the whole device.
async fn switch<A: ChannelAdapter>(
    device: &mut Device<A>,
    action: SwitchAction,
    channel: Option<u8>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let target = power_state(action == SwitchAction::On);
    match channel {
        Some(channel) => {
            let outcome = match target {
                PowerState::On => device.turn_on_channel(channel).await?,
                PowerState::Off => device.turn_off_channel(channel).await?,
            };
            writeln!(out, "{}", describe_outcome(channel, target, outcome))?;
        }
        None => {
            let report = match target {
                PowerState::On => device.all_on().await?,
                PowerState::Off => device.all_off().await?,
            };
            writeln!(out, "{}", describe_report(&report))?;
        }
    }
    Ok(())
}

fn describe_outcome(channel: u8, target: PowerState, outcome: SwitchOutcome) -> String {
    match outcome {
        SwitchOutcome::Confirmed { attempts } => {
            format!("channel {channel} {target} (confirmed after {attempts} attempt(s))")
        }
        SwitchOutcome::Unconfirmed {
            attempts,
            last_observed,
        } => format!(
            "channel {channel} not confirmed {target} after {attempts} attempt(s), last seen {last_observed}"
        ),
    }
}

fn describe_report(report: &DeviceReport) -> String {
    let list = |channels: &[u8]| {
        channels
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    };
    if report.is_complete() {
        format!("{}: channels {} {}", report.device, list(&report.confirmed), report.target)
    } else {
        format!(
            "{}: channels {} {}, channels {} failed",
            report.device,
            list(&report.confirmed),
            report.target,
            list(&report.failed)
        )
    }
}
