//! Rack wiring: one concrete device per configured endpoint, sequenced by
//! the power plan.

use labrack_adapter_digest_http::{DigestHttpError, WebLine};
use labrack_adapter_line_tcp::Mx180tp;
use labrack_adapter_scrape_http::{Egpm2, ScrapeHttpError};
use labrack_app::device::{Device, DeviceReport};
use labrack_app::orchestrator::PowerOrchestrator;
use labrack_app::ports::SwitchableDevice;
use labrack_domain::channel::{ChannelSelection, PowerState};
use labrack_domain::endpoint::ProtocolKind;
use labrack_domain::error::{LabRackError, ValidationError};

use crate::config::{Config, ConfigError};

/// The rack as driven by the daemon.
pub type Rack = PowerOrchestrator<RackDevice>;

/// Any device the rack can hold, one variant per protocol family.
pub enum RackDevice {
    Strip(Device<Egpm2>),
    Relay(Device<WebLine>),
    Supply(Device<Mx180tp>),
}

impl SwitchableDevice for RackDevice {
    fn name(&self) -> &str {
        match self {
            Self::Strip(device) => device.name(),
            Self::Relay(device) => device.name(),
            Self::Supply(device) => device.name(),
        }
    }

    async fn switch(
        &mut self,
        channels: &ChannelSelection,
        target: PowerState,
    ) -> Result<DeviceReport, LabRackError> {
        match self {
            Self::Strip(device) => device.switch(channels, target).await,
            Self::Relay(device) => device.switch(channels, target).await,
            Self::Supply(device) => device.switch(channels, target).await,
        }
    }
}

/// Errors raised while assembling the rack.
#[derive(Debug, thiserror::Error)]
pub enum RackError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to set up HTTP client")]
    ScrapeHttp(#[from] ScrapeHttpError),
    #[error("failed to set up HTTP client")]
    DigestHttp(#[from] DigestHttpError),
    #[error("power plan does not match the devices")]
    Plan(#[from] ValidationError),
}

/// Build every configured device.
///
/// # Errors
///
/// Returns [`RackError`] if an endpoint is invalid or an HTTP client cannot
/// be created.
pub fn build_devices(config: &Config) -> Result<Vec<RackDevice>, RackError> {
    let policy = config.retry_policy();
    let adapters = &config.adapters;
    config
        .endpoints()?
        .into_iter()
        .map(|endpoint| -> Result<RackDevice, RackError> {
            tracing::debug!(%endpoint, "adding device");
            Ok(match endpoint.protocol() {
                ProtocolKind::ScrapeHttp => RackDevice::Strip(Device::new(
                    Egpm2::new(endpoint, &adapters.scrape_http)?,
                    policy,
                )),
                ProtocolKind::DigestHttp => RackDevice::Relay(Device::new(
                    WebLine::new(endpoint, &adapters.digest_http)?,
                    policy,
                )),
                ProtocolKind::LineTcp => RackDevice::Supply(Device::new(
                    Mx180tp::new(endpoint, &adapters.line_tcp),
                    policy,
                )),
            })
        })
        .collect()
}

/// Build the rack: every configured device, sequenced by the configured plan.
///
/// # Errors
///
/// Returns [`RackError`] if a device cannot be built or the plan names an
/// unknown device.
pub fn build(config: &Config) -> Result<Rack, RackError> {
    let devices = build_devices(config)?;
    Ok(PowerOrchestrator::new(devices, config.plan.clone())?)
}
