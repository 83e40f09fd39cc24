//! Unix signal handling.
//!
//! | Signal | Request |
//! |--------|---------|
//! | `SIGUSR1` | power the rack off |
//! | `SIGUSR2` | power the rack on |
//! | `SIGINT`, `SIGTERM` | stop the daemon |

use labrack_domain::rack::PowerAction;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;

use crate::runner::Request;

/// Install the signal handlers and forward every signal to `requests`.
///
/// Must be called from within the runtime.
///
/// # Errors
///
/// Returns an error if a handler cannot be registered.
pub fn listen(requests: mpsc::Sender<Request>) -> std::io::Result<()> {
    let mut usr1 = signal(SignalKind::user_defined1())?;
    let mut usr2 = signal(SignalKind::user_defined2())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    tokio::spawn(async move {
        loop {
            let request = tokio::select! {
                Some(()) = usr1.recv() => {
                    tracing::warn!(signal = "SIGUSR1", "power-off requested");
                    Request::Override(PowerAction::PowerOff)
                }
                Some(()) = usr2.recv() => {
                    tracing::warn!(signal = "SIGUSR2", "power-on requested");
                    Request::Override(PowerAction::PowerOn)
                }
                Some(()) = interrupt.recv() => {
                    tracing::info!(signal = "SIGINT", "shutdown requested");
                    Request::Shutdown
                }
                Some(()) = terminate.recv() => {
                    tracing::info!(signal = "SIGTERM", "shutdown requested");
                    Request::Shutdown
                }
                else => break,
            };
            if requests.send(request).await.is_err() {
                break;
            }
        }
    });

    Ok(())
}
