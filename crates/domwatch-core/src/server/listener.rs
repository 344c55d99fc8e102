//! Stream listeners the control plane can serve on
//!
//! The server only needs something that hands out byte streams. Plain TCP
//! is built in; a TLS acceptor wrapping a [`TcpListener`] plugs in the same
//! way, so transport security stays outside this crate.

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};

/// Source of inbound control-plane connections
///
/// # Trust Level
///
/// Everything read from an accepted stream is untrusted until the session
/// has seen a matching `AUTH` line.
#[async_trait]
pub trait Listener: Send + 'static {
    /// The connection type handed to sessions
    type Stream: AsyncRead + AsyncWrite + Send + 'static;

    /// Wait for the next connection
    async fn accept(&mut self) -> io::Result<(Self::Stream, SocketAddr)>;

    /// The address this listener is bound to
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

#[async_trait]
impl Listener for TcpListener {
    type Stream = TcpStream;

    async fn accept(&mut self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpListener::local_addr(self)
    }
}
