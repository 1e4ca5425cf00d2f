// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)

use crate::logger;

/// Wait until a shutdown signal arrives (Unix)
#[cfg(unix)]
pub async fn wait_for_shutdown() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            logger::log_error(&format!("Failed to register SIGTERM handler: {e}"));
            // Fall back to Ctrl+C only
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            logger::log_error(&format!("Failed to register SIGINT handler: {e}"));
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            logger::log_warning("SIGTERM received, shutting down");
        }
        _ = sigint.recv() => {
            logger::log_warning("SIGINT received, shutting down");
        }
    }
}

/// Wait until Ctrl+C arrives (non-Unix fallback)
#[cfg(not(unix))]
pub async fn wait_for_shutdown() {
    if tokio::signal::ctrl_c().await.is_ok() {
        logger::log_warning("Ctrl+C received, shutting down");
    }
}
