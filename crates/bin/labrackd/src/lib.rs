//! # labrackd: lab rack power daemon
//!
//! Composition root that wires the device adapters into a rack and runs its
//! weekly power schedule.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Construct one adapter per configured device and wrap it in a device facade
//! - Validate the power plan against the configured devices
//! - Run the schedule loop, feeding it clock ticks and operator signals
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

pub mod config;
pub mod rack;
pub mod runner;
pub mod signals;
