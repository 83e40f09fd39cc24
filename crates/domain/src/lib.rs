//! # labrack-domain
//!
//! Pure domain model for the labrack power controller.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, wall-clock helpers
//! - Define **Channels** (switchable outlets) and their observed/desired states
//! - Define **Device endpoints** (address, protocol family, credentials)
//! - Define the **Weekly schedule** (morning power-on, evening power-off, rest days)
//! - Define the **Power plan** (ordered per-device steps for rack on/off)
//! - Define the **Rack state** and the invariant guarding redundant transitions
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod channel;
pub mod endpoint;
pub mod plan;
pub mod rack;
pub mod schedule;
