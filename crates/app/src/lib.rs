//! # labrack-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ChannelAdapter`: read/write the on/off state of one device channel
//! - Define the traits the use-cases are composed through:
//!   - `SwitchableDevice`: a device facade addressed by a power plan step
//!   - `RackPower`: whole-rack power on/off, driven by the scheduler
//! - Provide the use-cases:
//!   - `ConfirmedSwitch`: bounded retry-until-verified state transition
//!   - `Device`: whole-device and single-channel on/off
//!   - `PowerOrchestrator`: ordered, best-effort fleet sequencing
//!   - `PowerScheduler`: weekly schedule plus override requests
//!
//! ## Dependency rule
//! Depends on `labrack-domain` only (plus `tokio::time` for timeouts).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod device;
pub mod orchestrator;
pub mod ports;
pub mod scheduler;
pub mod switch;

#[cfg(test)]
pub(crate) mod testing;
