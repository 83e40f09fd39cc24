//! Power orchestrator: runs the ordered power plan across the device fleet.
//!
//! The plan is a fixed list of steps per action. Order matters: downstream
//! equipment expects its upstream supply to switch first. A failing step is
//! logged with its device and channels and the next step still runs.

use labrack_domain::channel::{ChannelSelection, PowerState};
use labrack_domain::error::{LabRackError, ValidationError};
use labrack_domain::plan::{PowerPlan, PowerStep};
use labrack_domain::rack::PowerAction;

use crate::device::DeviceReport;
use crate::ports::{RackPower, SwitchableDevice};

/// What happened to one plan step.
#[derive(Debug)]
pub struct StepReport {
    pub device: String,
    pub channels: ChannelSelection,
    pub outcome: Result<DeviceReport, LabRackError>,
}

impl StepReport {
    /// The device was reached and every addressed channel converged.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcome
            .as_ref()
            .is_ok_and(DeviceReport::is_complete)
    }
}

/// Result of a whole-rack operation: one entry per attempted step, in order.
#[derive(Debug)]
pub struct PowerReport {
    pub action: PowerAction,
    pub steps: Vec<StepReport>,
}

impl PowerReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(StepReport::is_complete)
    }

    /// Devices with at least one step that did not fully succeed.
    pub fn failed_devices(&self) -> impl Iterator<Item = &str> {
        self.steps
            .iter()
            .filter(|step| !step.is_complete())
            .map(|step| step.device.as_str())
    }
}

/// Sequences the configured devices into rack power-on and power-off.
pub struct PowerOrchestrator<D> {
    devices: Vec<D>,
    plan: PowerPlan,
}

impl<D: SwitchableDevice> PowerOrchestrator<D> {
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownDevice`] when a plan step names a
    /// device that is not in `devices`.
    pub fn new(devices: Vec<D>, plan: PowerPlan) -> Result<Self, ValidationError> {
        plan.check_devices(devices.iter().map(SwitchableDevice::name))?;
        Ok(Self { devices, plan })
    }

    #[must_use]
    pub fn devices(&self) -> &[D] {
        &self.devices
    }

    #[must_use]
    pub fn plan(&self) -> &PowerPlan {
        &self.plan
    }

    #[tracing::instrument(skip(self))]
    async fn run(&mut self, action: PowerAction) -> PowerReport {
        let (steps, target) = match action {
            PowerAction::PowerOn => (&self.plan.power_on, PowerState::On),
            PowerAction::PowerOff => (&self.plan.power_off, PowerState::Off),
        };
        tracing::info!(steps = steps.len(), "starting rack {action}");

        let mut report = PowerReport {
            action,
            steps: Vec::with_capacity(steps.len()),
        };
        for step in steps {
            let outcome = run_step(&mut self.devices, step, target).await;
            match &outcome {
                Ok(device) if device.is_complete() => tracing::debug!(
                    device = %step.device,
                    channels = %step.channels,
                    "step completed"
                ),
                Ok(device) => tracing::warn!(
                    device = %step.device,
                    failed = ?device.failed,
                    "step completed partially"
                ),
                Err(err) => tracing::error!(
                    device = %step.device,
                    channels = %step.channels,
                    error = %err,
                    "step failed, continuing with next device"
                ),
            }
            report.steps.push(StepReport {
                device: step.device.clone(),
                channels: step.channels.clone(),
                outcome,
            });
        }

        if report.is_complete() {
            tracing::info!("rack {action} completed");
        } else {
            let failed: Vec<&str> = report.failed_devices().collect();
            tracing::warn!(?failed, "rack {action} completed with failures");
        }
        report
    }
}

async fn run_step<D: SwitchableDevice>(
    devices: &mut [D],
    step: &PowerStep,
    target: PowerState,
) -> Result<DeviceReport, LabRackError> {
    let device = devices
        .iter_mut()
        .find(|device| device.name() == step.device)
        .ok_or_else(|| ValidationError::UnknownDevice(step.device.clone()))?;
    device.switch(&step.channels, target).await
}

impl<D: SwitchableDevice> RackPower for PowerOrchestrator<D> {
    async fn power_on(&mut self) -> PowerReport {
        self.run(PowerAction::PowerOn).await
    }

    async fn power_off(&mut self) -> PowerReport {
        self.run(PowerAction::PowerOff).await
    }
}
