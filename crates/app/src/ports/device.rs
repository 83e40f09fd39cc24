//! Switchable device port: what the orchestrator needs from a device facade.

use std::future::Future;

use labrack_domain::channel::{ChannelSelection, PowerState};
use labrack_domain::error::LabRackError;

use crate::device::DeviceReport;

/// A device that can be addressed by a power plan step.
///
/// Implemented by [`Device`](crate::device::Device) for every adapter. The
/// composition root wraps its concrete device types in an enum implementing
/// this trait so one orchestrator can drive a heterogeneous fleet.
pub trait SwitchableDevice: Send {
    /// Name used by power plan steps to address this device.
    fn name(&self) -> &str;

    /// Move the selected channels to `target`, one confirmed switch per channel.
    ///
    /// Per-channel failures are recorded in the report. An error is returned
    /// only when the device as a whole could not be reached.
    fn switch(
        &mut self,
        selection: &ChannelSelection,
        target: PowerState,
    ) -> impl Future<Output = Result<DeviceReport, LabRackError>> + Send;
}
