//! Out-of-process status probe
//!
//! Connects to a running ingestion server, sends `{"monitor_client":true}`
//! and decodes the single reply line.

use anyhow::{Context, Result, bail};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::protocol::{MONITOR_KEY, StatusSnapshot};

/// Ask the server at `addr` for its counter snapshot
///
/// The whole exchange (connect, write, read) must finish within `timeout`.
///
/// # Errors
/// Returns error if the server is unreachable, too slow, closes the
/// connection early or answers with something other than a status reply
pub async fn query_status(addr: SocketAddr, timeout: Duration) -> Result<StatusSnapshot> {
    tokio::time::timeout(timeout, exchange(addr))
        .await
        .with_context(|| format!("Status probe to {} timed out after {:?}", addr, timeout))?
}

async fn exchange(addr: SocketAddr) -> Result<StatusSnapshot> {
    let mut stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("Failed to connect to {}", addr))?;

    let probe = serde_json::json!({ MONITOR_KEY: true });
    let mut request = serde_json::to_vec(&probe)?;
    request.push(b'\n');
    stream.write_all(&request).await?;

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        bail!("Server at {} closed the connection without replying", addr);
    }

    serde_json::from_str(line.trim_end())
        .with_context(|| format!("Unexpected status reply from {}: {}", addr, line.trim_end()))
}
