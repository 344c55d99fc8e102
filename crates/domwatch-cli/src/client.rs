//! One-shot control-plane exchange
//!
//! Each invocation opens a connection, authenticates, sends one command,
//! reads at most one reply line and says goodbye with `CLOSE`.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Send `command` and return the server's reply line
pub async fn exchange(host: &str, port: u16, token: &str, command: &str) -> Result<String> {
    let stream = TcpStream::connect((host, port))
        .await
        .with_context(|| format!("could not connect to {}:{}", host, port))?;
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    writer
        .write_all(format!("AUTH {}\n{}\n", token, command).as_bytes())
        .await
        .context("failed to send command")?;

    let reply = tokio::time::timeout(REPLY_TIMEOUT, lines.next_line())
        .await
        .context("timed out waiting for a reply")?
        .context("failed to read reply")?;

    // Best effort; the server may already be gone
    let _ = writer.write_all(b"CLOSE\n").await;
    let _ = writer.shutdown().await;

    match reply {
        Some(line) if line == "authentication failure" => {
            bail!("authentication failed: check the token (domwatch set token <value>)")
        }
        Some(line) => Ok(line),
        None => bail!("server closed the connection without replying"),
    }
}
