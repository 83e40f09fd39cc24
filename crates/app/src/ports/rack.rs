//! Rack power port: whole-rack operations driven by the scheduler.

use std::future::Future;

use crate::orchestrator::PowerReport;

/// Whole-rack power operations.
///
/// Both operations are best effort and never fail as a whole: what went
/// wrong is described in the returned [`PowerReport`].
pub trait RackPower: Send {
    fn power_on(&mut self) -> impl Future<Output = PowerReport> + Send;

    fn power_off(&mut self) -> impl Future<Output = PowerReport> + Send;
}
