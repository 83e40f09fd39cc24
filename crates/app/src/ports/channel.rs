//! Channel adapter port: protocol-specific access to device channels.
//!
//! An adapter translates "read channel state" / "set channel state" into the
//! wire calls of one device family (scraped HTML, digest-authenticated CGI,
//! line-oriented TCP, …). Adapters make no attempt to confirm their writes;
//! that is the job of [`ConfirmedSwitch`](crate::switch::ConfirmedSwitch).

use std::future::Future;

use labrack_domain::channel::{ChannelRange, ChannelState, PowerState};
use labrack_domain::error::LabRackError;

/// Protocol-specific access to the channels of one device.
///
/// Methods take `&mut self`: a device connection is never used by two
/// operations at once.
pub trait ChannelAdapter: Send {
    /// Operator-facing device name, used in logs and reports.
    fn device_name(&self) -> &str;

    /// Valid channel indices of the device.
    fn channels(&self) -> ChannelRange;

    /// Observe the current state of `channel`.
    ///
    /// Adapters return [`ChannelState::Unknown`] when the device answered but
    /// the state could not be determined (e.g. a read timeout on an open
    /// connection), and an error when the device could not be reached or its
    /// payload was malformed.
    fn read_state(
        &mut self,
        channel: u8,
    ) -> impl Future<Output = Result<ChannelState, LabRackError>> + Send;

    /// Ask the device to move `channel` to `desired`.
    ///
    /// Fire-and-forget: success means the request was sent, not that the
    /// channel changed.
    fn write_state(
        &mut self,
        channel: u8,
        desired: PowerState,
    ) -> impl Future<Output = Result<(), LabRackError>> + Send;
}
