//! Restart-on-failure wrapper around the receive loop.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info};

/// A long-running loop that returns `Ok` on intentional shutdown and `Err`
/// when it crashed.
pub trait ReceiveLoop {
    fn run(&mut self) -> impl Future<Output = Result<()>>;
}

/// Run `receiver` until it stops cleanly, restarting it after `pause` each
/// time it fails. There is no retry limit and no backoff growth.
///
/// `shutdown` is polled for the whole lifetime of the supervisor, so it
/// interrupts both a running receiver and a restart pause.
///
/// Returns the number of restarts.
pub async fn supervise<R: ReceiveLoop>(
    receiver: &mut R,
    pause: Duration,
    shutdown: impl Future<Output = ()>,
) -> u64 {
    tokio::pin!(shutdown);

    let mut restarts = 0;
    loop {
        info!("Starting bot");
        let outcome = tokio::select! {
            () = &mut shutdown => break,
            outcome = receiver.run() => outcome,
        };
        match outcome {
            Ok(()) => return restarts,
            Err(e) => {
                error!(error = ?e, "Bot crashed");
                info!("Waiting {} seconds before restart...", pause.as_secs_f64());
                tokio::select! {
                    () = &mut shutdown => break,
                    () = tokio::time::sleep(pause) => restarts += 1,
                }
            }
        }
    }

    info!("Shutdown requested");
    restarts
}
