//! Graceful shutdown via `CancellationToken`.
//!
//! The binary hands [`ShutdownCoordinator::token`] to
//! `axum::serve(..).with_graceful_shutdown(..)`: once cancelled the listener
//! stops accepting and in-flight requests are allowed to finish.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Shared shutdown signal.
#[derive(Clone, Debug, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a coordinator that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clone of the cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Initiate shutdown. Idempotent.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Cancel the token on Ctrl-C or, on Unix, SIGTERM.
    pub fn listen_for_signals(&self) {
        let coordinator = self.clone();
        drop(tokio::spawn(async move {
            wait_for_signal().await;
            info!("shutdown signal received");
            coordinator.shutdown();
        }));
    }
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                let _ = sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_not_shutting_down() {
        let coord = ShutdownCoordinator::new();
        assert!(!coord.token().is_cancelled());
    }

    #[test]
    fn shutdown_is_idempotent() {
        let coord = ShutdownCoordinator::new();
        coord.shutdown();
        coord.shutdown();
        assert!(coord.token().is_cancelled());
    }

    #[test]
    fn clones_share_the_token() {
        let coord = ShutdownCoordinator::new();
        let token = coord.token();
        coord.clone().shutdown();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_future_resolves() {
        let coord = ShutdownCoordinator::new();
        let token = coord.token();
        let handle = tokio::spawn(async move {
            token.cancelled().await;
            true
        });
        coord.shutdown();
        assert!(handle.await.unwrap());
    }
}
