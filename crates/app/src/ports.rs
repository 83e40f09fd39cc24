//! Port definitions: traits that adapters and use-cases implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod channel;
pub mod device;
pub mod rack;

pub use channel::ChannelAdapter;
pub use device::SwitchableDevice;
pub use rack::RackPower;
