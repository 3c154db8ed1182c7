//! Ctrl-C handling.
//!
//! Once tokio's SIGINT handler is installed the default "terminate" behavior
//! is gone for the rest of the process, so every long await (line reads,
//! inference calls, subprocesses) races against [`interrupted`].

use tracing::warn;

/// Resolves when the user presses Ctrl-C. Never resolves if the handler
/// can't be installed.
pub async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
