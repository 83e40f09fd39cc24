//! # labrackctl: single-device control
//!
//! Talks to one rack device directly, without the daemon: print its status,
//! switch one channel (confirmed) or the whole device, change a bench supply
//! voltage.
//!
//! Exit code is `0` on success and `1` on any argument or device error.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let filter = std::env::var("LABRACK_LOG")
        .ok()
        .and_then(|filter| EnvFilter::try_new(filter).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut stdout = std::io::stdout().lock();
    let result = commands::run(cli.device, &mut stdout).await;
    if let Err(err) = &result {
        eprintln!("{err}");
    }
    ExitCode::from(commands::exit_status(&result))
}
