//! Control-plane server
//!
//! A line-oriented text protocol for editing the watch-list remotely:
//!
//! | Request | Reply |
//! |---|---|
//! | `AUTH <token>` | nothing on success, `authentication failure` otherwise |
//! | `ADD <domain>` | `<domain> added` |
//! | `REMOVE <domain>` | `<domain> removed` |
//! | `LIST` | space-joined watch-list |
//! | `EXIT` / `QUIT` / `CLOSE` | connection closes |
//!
//! `ADD`, `REMOVE` and `LIST` reply `unauthenticated` until the session has
//! sent the right token. Unknown commands are ignored.
//!
//! ## Shutdown
//!
//! The accept loop and every session select on the same [`Shutdown`].
//! Once it fires the accept loop drops the listener, then waits for each
//! session to close its stream.

pub mod command;
pub mod listener;
pub mod session;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::shutdown::Shutdown;
use crate::watchlist::WatchList;

pub use command::Command;
pub use listener::Listener;

/// Pause after a failed accept so a persistent error does not spin
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Running control-plane server
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use domwatch_core::{ControlServer, ServerConfig, Shutdown, WatchList};
///
/// #[tokio::main]
/// async fn main() -> domwatch_core::Result<()> {
///     let config = ServerConfig::new("s3cret").with_bind_addr("127.0.0.1:8081");
///     let shutdown = Shutdown::new();
///     let server = ControlServer::bind(&config, Arc::new(WatchList::new()), shutdown).await?;
///
///     println!("listening on {}", server.local_addr());
///     server.close().await;
///     Ok(())
/// }
/// ```
pub struct ControlServer {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl ControlServer {
    /// Bind a TCP listener per `config` and start serving
    ///
    /// A bind failure is returned as [`Error::Config`].
    pub async fn bind(
        config: &ServerConfig,
        watchlist: Arc<WatchList>,
        shutdown: Shutdown,
    ) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.bind_addr).await.map_err(|e| {
            Error::config(format!(
                "Failed to bind control plane to {}: {}",
                config.bind_addr, e
            ))
        })?;

        Self::start(listener, config.auth_token.as_str(), watchlist, shutdown)
    }

    /// Start serving on an already bound listener
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<L: Listener>(
        listener: L,
        auth_token: impl Into<String>,
        watchlist: Arc<WatchList>,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let local_addr = listener.local_addr()?;
        let auth_token: Arc<str> = Arc::from(auth_token.into());

        let accept_task = tokio::spawn(accept_loop(
            listener,
            auth_token,
            watchlist,
            shutdown.clone(),
        ));

        info!("Control plane listening on {}", local_addr);

        Ok(Self {
            local_addr,
            shutdown,
            accept_task: Mutex::new(Some(accept_task)),
        })
    }

    /// The address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Fire the shutdown signal and wait until every session has closed
    ///
    /// Safe to call more than once, and after the signal was fired
    /// elsewhere.
    pub async fn close(&self) {
        self.shutdown.trigger();

        let Some(task) = self.accept_task.lock().await.take() else {
            return;
        };

        if let Err(e) = task.await {
            warn!("Control plane accept loop ended abnormally: {}", e);
        }
    }
}

async fn accept_loop<L: Listener>(
    mut listener: L,
    auth_token: Arc<str>,
    watchlist: Arc<WatchList>,
    shutdown: Shutdown,
) {
    let mut sessions = JoinSet::new();

    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            Some(_) = sessions.join_next(), if !sessions.is_empty() => {}
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!("Accepted control connection from {}", peer);
                    sessions.spawn(session::serve(
                        stream,
                        peer,
                        watchlist.clone(),
                        auth_token.clone(),
                        shutdown.clone(),
                    ));
                }
                Err(e) => {
                    warn!("Failed to accept control connection: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            },
        }
    }

    drop(listener);
    info!("Control plane listener closed, draining {} session(s)", sessions.len());

    while let Some(joined) = sessions.join_next().await {
        if let Err(e) = joined {
            warn!("Control session ended abnormally: {}", e);
        }
    }

    debug!("Control plane stopped");
}
