//! The daemon loop: clock ticks and operator requests, one at a time.
//!
//! Ticks and requests are multiplexed in a single task. A request that
//! arrives while a rack operation is in flight waits in the channel until
//! that operation returns.

use std::time::Duration;

use chrono::NaiveDateTime;
use labrack_app::ports::RackPower;
use labrack_app::scheduler::PowerScheduler;
use labrack_domain::rack::PowerAction;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Something asked of the daemon from outside the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Run this rack action now.
    Override(PowerAction),
    /// Stop the loop.
    Shutdown,
}

/// Drive `scheduler` until a [`Request::Shutdown`] arrives or every request
/// sender is dropped.
///
/// `clock` is read on every tick of `poll_interval`.
pub async fn run<R, C>(
    scheduler: &mut PowerScheduler<R>,
    poll_interval: Duration,
    clock: C,
    mut requests: mpsc::Receiver<Request>,
) where
    R: RackPower,
    C: Fn() -> NaiveDateTime,
{
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tracing::info!(?poll_interval, state = %scheduler.state(), "schedule loop started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                scheduler.tick(clock()).await;
            }
            request = requests.recv() => match request {
                Some(Request::Override(action)) => {
                    scheduler.handle_override(action).await;
                }
                Some(Request::Shutdown) | None => break,
            },
        }
    }

    tracing::info!(state = %scheduler.state(), "schedule loop stopped");
}
