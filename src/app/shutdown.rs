//! Ctrl-C handling.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancels `cancel` on the first Ctrl-C.
///
/// The running cycle stops at its next pause or network call; in loop mode
/// no further cycle starts.
pub fn spawn_ctrl_c_handler(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => log::warn!("Interrupted, finishing after the current step"),
                    Err(e) => {
                        log::warn!("Could not listen for Ctrl-C: {e}");
                        return;
                    }
                }
                cancel.cancel();
            }
            _ = cancel.cancelled() => {}
        }
    })
}

/// Stops the Ctrl-C listener once work is done.
pub async fn shutdown_gracefully(cancel: CancellationToken, signal_task: JoinHandle<()>) {
    cancel.cancel();
    let _ = signal_task.await;
}
