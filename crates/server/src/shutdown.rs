//! Ctrl+C handling for the `screen` and `serve` commands

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cancels its token on the first Ctrl+C
#[derive(Clone)]
pub struct ShutdownController {
    token: CancellationToken,
}

impl ShutdownController {
    /// Spawns the signal listener; must be called inside a tokio runtime.
    pub fn with_ctrl_c() -> Self {
        let token = CancellationToken::new();
        let on_signal = token.clone();

        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received, shutting down");
            on_signal.cancel();
        });

        Self { token }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// `Some(output)` when `work` finishes first, `None` when `token` fires first
pub async fn run_until_shutdown<F, T>(token: CancellationToken, work: F) -> Option<T>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        output = work => Some(output),
    }
}
