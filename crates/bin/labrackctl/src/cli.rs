//! Command-line arguments.
//!
//! ```text
//! labrackctl strip  <ip> [--port P] [--password PW]       [status|on|off] [channel]
//! labrackctl relay  <ip> [--port P] [--user U] [--password PW] [status|on|off] [relay]
//! labrackctl supply <ip> [--port P]                   [status|on|off|set-voltage] [channel] [volts]
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "labrackctl", version)]
#[command(about = "Control one lab rack device", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub device: DeviceCommand,
}

#[derive(Debug, Subcommand)]
pub enum DeviceCommand {
    /// Four-socket power strip with a scraped status page (EGPM2)
    Strip {
        #[command(flatten)]
        target: Target,

        /// Login password
        #[arg(long, default_value = "1")]
        password: String,

        #[arg(value_enum)]
        action: Option<SwitchAction>,

        /// Socket 1-4; every socket when omitted
        channel: Option<u8>,
    },
    /// Digest-authenticated relay strip (Web-Line)
    Relay {
        #[command(flatten)]
        target: Target,

        #[arg(long, default_value = "admin")]
        user: String,

        #[arg(long, default_value = "admin")]
        password: String,

        #[arg(value_enum)]
        action: Option<SwitchAction>,

        /// Relay index; every relay when omitted
        relay: Option<u8>,
    },
    /// Three-output bench power supply (MX180TP)
    Supply {
        #[command(flatten)]
        target: Target,

        #[arg(value_enum)]
        action: Option<SupplyAction>,

        /// Output 1-3; every output when omitted
        channel: Option<u8>,

        /// Volts, for `set-voltage`
        value: Option<f64>,
    },
}

/// Where the device lives.
#[derive(Debug, Args)]
pub struct Target {
    /// Device IP address or host name
    pub ip: String,

    /// TCP port; the protocol's usual port when omitted
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SwitchAction {
    /// Print the state of every channel
    Status,
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SupplyAction {
    /// Print identity and readings of every output
    Status,
    On,
    Off,
    /// Change the voltage setpoint of one output
    SetVoltage,
}
