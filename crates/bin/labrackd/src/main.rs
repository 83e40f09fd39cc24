#![recursion_limit = "256"]

use labrack_app::scheduler::PowerScheduler;
use labrack_domain::time::local_now;
use labrackd::config::Config;
use labrackd::{rack, runner, signals};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Rack
    let schedule = config.weekly_schedule()?;
    let rack = rack::build(&config)?;
    tracing::info!(
        devices = rack.devices().len(),
        power_on_at = %config.schedule.power_on_at,
        power_off_at = %config.schedule.power_off_at,
        "labrackd starting"
    );
    let mut scheduler = PowerScheduler::new(schedule, rack);

    // Operator requests
    let (requests_tx, requests_rx) = mpsc::channel(16);
    signals::listen(requests_tx)?;

    runner::run(&mut scheduler, config.poll_interval(), local_now, requests_rx).await;

    Ok(())
}
