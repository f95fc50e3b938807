//! Server lifecycle traits
//!
//! [`Server`] is what a listener implements; [`ServerExt`] adds the
//! spawn and Ctrl+C helpers the binary uses.

use async_trait::async_trait;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

#[async_trait]
pub trait Server: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Bound address while running, `None` otherwise
    fn address(&self) -> Option<SocketAddr>;

    /// Serve until `shutdown` is cancelled, draining in-flight requests.
    async fn run(&self, shutdown: CancellationToken) -> Result<()>;
}

pub trait ServerExt: Server + Sized {
    /// Run on a new task; cancel the returned token to stop it.
    fn spawn(self) -> (tokio::task::JoinHandle<Result<()>>, CancellationToken) {
        let token = CancellationToken::new();
        let stop = token.clone();
        let handle = tokio::spawn(async move { self.run(stop).await });
        (handle, token)
    }

    fn run_with_ctrl_c(self) -> impl std::future::Future<Output = Result<()>> + Send {
        async move {
            let shutdown = crate::shutdown::ShutdownController::with_ctrl_c();
            self.run(shutdown.token()).await
        }
    }
}

impl<T: Server + Sized> ServerExt for T {}
