//! One control-plane connection
//!
//! ## Task Layout
//!
//! ```text
//!  stream ──split──► read half ──► reader task ──Command──► queue (16)
//!                                                             │
//!                    write half ◄── replies ◄── handler ◄─────┘
//!                                                  ▲
//!                                      shutdown ───┘
//! ```
//!
//! The reader task owns the read half and only parses. The handler owns
//! the write half and the authentication flag, so commands from one
//! connection are applied strictly in arrival order.

use std::net::SocketAddr;
use std::sync::Arc;

use std::time::Duration;

use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::command::Command;
use crate::error::{Error, Result};
use crate::shutdown::Shutdown;
use crate::watchlist::WatchList;

/// Longest accepted command line, in bytes
pub const MAX_LINE_LEN: usize = 4096;

/// Commands buffered between the reader task and the handler
const QUEUE_CAPACITY: usize = 16;

/// Upper bound on the closing write-half shutdown once the session ends
const WRITER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// What the handler does after a command
#[derive(Debug, PartialEq, Eq)]
enum Reply {
    Silent,
    Line(String),
    Close,
}

/// Per-connection command state
struct Session {
    peer: SocketAddr,
    watchlist: Arc<WatchList>,
    auth_token: Arc<str>,
    authenticated: bool,
}

impl Session {
    fn new(peer: SocketAddr, watchlist: Arc<WatchList>, auth_token: Arc<str>) -> Self {
        Self {
            peer,
            watchlist,
            auth_token,
            authenticated: false,
        }
    }

    async fn handle(&mut self, command: Command) -> Reply {
        debug!("{} -> {}", self.peer, command.name());

        match command {
            Command::Auth(token) => {
                if token.as_deref() == Some(&*self.auth_token) {
                    self.authenticated = true;
                    Reply::Silent
                } else {
                    warn!("Authentication failure from {}", self.peer);
                    Reply::Line("authentication failure".to_string())
                }
            }
            Command::Close => Reply::Close,
            Command::Unknown(name) => {
                debug!("Ignoring unknown command '{}' from {}", name, self.peer);
                Reply::Silent
            }
            _ if !self.authenticated => Reply::Line("unauthenticated".to_string()),
            Command::Add(domain) => {
                let Some(domain) = domain else {
                    return Reply::Line("missing domain".to_string());
                };
                match self.watchlist.add(&domain).await {
                    Ok(_) => Reply::Line(format!("{} added", domain)),
                    Err(e) => {
                        debug!("Rejected ADD from {}: {}", self.peer, e);
                        Reply::Line("invalid domain".to_string())
                    }
                }
            }
            Command::Remove(domain) => {
                let Some(domain) = domain else {
                    return Reply::Line("missing domain".to_string());
                };
                self.watchlist.remove(&domain).await;
                Reply::Line(format!("{} removed", domain))
            }
            Command::List => Reply::Line(self.watchlist.list().await.join(" ")),
        }
    }
}

/// Serve one connection until the client leaves or `shutdown` fires
pub(crate) async fn serve<S>(
    stream: S,
    peer: SocketAddr,
    watchlist: Arc<WatchList>,
    auth_token: Arc<str>,
    shutdown: Shutdown,
) where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let (tx, mut rx) = mpsc::channel(QUEUE_CAPACITY);

    let reader_task = tokio::spawn(async move {
        if let Err(e) = read_commands(reader, tx).await {
            warn!("Closing connection from {}: {}", peer, e);
        }
    });

    let mut session = Session::new(peer, watchlist, auth_token);

    loop {
        let command = tokio::select! {
            biased;
            _ = shutdown.wait() => {
                debug!("Shutdown reached session {}", peer);
                break;
            }
            command = rx.recv() => match command {
                Some(command) => command,
                None => break,
            },
        };

        match session.handle(command).await {
            Reply::Silent => {}
            Reply::Close => break,
            Reply::Line(line) => {
                // A client that stops reading must not pin the session
                let written = tokio::select! {
                    biased;
                    _ = shutdown.wait() => {
                        debug!("Shutdown reached session {} mid-reply", peer);
                        break;
                    }
                    written = write_line(&mut writer, &line) => written,
                };
                if let Err(e) = written {
                    debug!("Write to {} failed: {}", peer, e);
                    break;
                }
            }
        }
    }

    reader_task.abort();
    drop(rx);
    if tokio::time::timeout(WRITER_SHUTDOWN_TIMEOUT, writer.shutdown())
        .await
        .is_err()
    {
        debug!("Write half of {} did not shut down in time", peer);
    }
    debug!("Session {} closed", peer);
}

/// Parse lines into the command queue until EOF or a protocol error
async fn read_commands<R>(reader: R, tx: mpsc::Sender<Command>) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    while let Some(line) = next_line(&mut reader, &mut buf).await? {
        let Some(command) = Command::parse(&line) else {
            continue;
        };

        // Handler gone; nothing left to feed
        if tx.send(command).await.is_err() {
            break;
        }
    }

    Ok(())
}

/// Read one line, never buffering more than `MAX_LINE_LEN` plus its terminator.
///
/// Returns `Ok(None)` at EOF. A final line without `\n` is still returned.
async fn next_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    // Room for the content plus "\r\n"
    let limit = MAX_LINE_LEN as u64 + 2;

    buf.clear();
    let read = (&mut *reader)
        .take(limit)
        .read_until(b'\n', buf)
        .await
        .map_err(|e| Error::protocol(format!("unreadable line: {}", e)))?;

    if read == 0 {
        return Ok(None);
    }

    let terminated = buf.last() == Some(&b'\n');
    if terminated {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }

    if buf.len() > MAX_LINE_LEN || (!terminated && read as u64 == limit) {
        return Err(Error::protocol(format!(
            "line exceeds {} byte limit",
            MAX_LINE_LEN
        )));
    }

    let line = std::str::from_utf8(buf)
        .map_err(|e| Error::protocol(format!("line is not UTF-8: {}", e)))?;

    Ok(Some(line.to_string()))
}

async fn write_line<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
