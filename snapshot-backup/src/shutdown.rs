//! SIGINT / SIGTERM handling.
//!
//! A signal cancels the run's token; the sync engine notices at the next
//! file boundary, and the audit log is still closed with a footer.

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Shutdown coordinator
pub struct ShutdownCoordinator {
    cancel_token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator
    pub fn new() -> Self {
        Self {
            cancel_token: CancellationToken::new(),
        }
    }

    /// Token handed to the sync engine
    pub fn token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Request cancellation
    pub fn trigger(&self) {
        self.cancel_token.cancel();
    }

    /// Wait for SIGINT or SIGTERM and cancel the token.
    ///
    /// Returns early if the token is cancelled by other means.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                warn!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT (Ctrl+C), finishing current file...");
            }
            _ = terminate => {
                info!("Received SIGTERM, finishing current file...");
            }
            _ = self.cancel_token.cancelled() => {
                return;
            }
        }

        self.trigger();
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_trigger_cancels_token() {
        let coordinator = ShutdownCoordinator::new();
        let token = coordinator.token();
        assert!(!token.is_cancelled());

        coordinator.trigger();

        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_wait_returns_once_cancelled() {
        let coordinator = Arc::new(ShutdownCoordinator::new());

        let waiter = Arc::clone(&coordinator);
        let handle = tokio::spawn(async move {
            waiter.wait_for_signal().await;
        });

        coordinator.trigger();

        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("listener did not stop")
            .unwrap();
    }
}
