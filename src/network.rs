//! Listener and client socket setup
//!
//! The ingestion socket is bound once with socket2 and every worker accepts
//! from its own clone of it.

use anyhow::{Context, Result};
use socket2::{Domain, Protocol, SockRef, Socket, Type};
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};
use tokio::net::TcpStream;
use tracing::debug;

use crate::constants::socket::LISTEN_BACKLOG;

/// Resolve a `host:port` string to the first matching address
///
/// # Errors
/// Returns error if the address cannot be parsed or resolves to nothing
pub fn resolve_addr(addr: &str) -> Result<SocketAddr> {
    addr.to_socket_addrs()
        .with_context(|| format!("Invalid listen address '{}'", addr))?
        .next()
        .with_context(|| format!("Listen address '{}' resolved to nothing", addr))
}

/// Bind the shared, non-blocking listening socket
///
/// # Errors
/// Returns error if the socket cannot be created, bound or put in listen mode
pub fn bind_listener(addr: SocketAddr) -> Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .context("Failed to create listening socket")?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket
        .bind(&addr.into())
        .with_context(|| format!("Failed to bind {}", addr))?;
    socket.listen(LISTEN_BACKLOG)?;
    Ok(socket.into())
}

/// Per-client socket options; failures are logged and ignored
pub fn tune_client_stream(stream: &TcpStream) {
    let sock_ref = SockRef::from(stream);
    if let Err(e) = sock_ref.set_nodelay(true) {
        debug!("Failed to set TCP_NODELAY on client socket: {}", e);
    }
    if let Err(e) = sock_ref.set_keepalive(true) {
        debug!("Failed to enable keepalive on client socket: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_addr() {
        let addr = resolve_addr("127.0.0.1:8100").unwrap();
        assert_eq!(addr.port(), 8100);
        assert!(resolve_addr("not an address").is_err());
    }

    #[test]
    fn test_bind_listener_ephemeral() {
        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        assert_ne!(addr.port(), 0);

        // Clones share the same bound socket
        let clone = listener.try_clone().unwrap();
        assert_eq!(clone.local_addr().unwrap(), addr);
    }

    #[test]
    fn test_bind_listener_in_use() {
        let first = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = first.local_addr().unwrap();
        assert!(bind_listener(addr).is_err());
    }

    #[tokio::test]
    async fn test_tune_client_stream() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();

        tune_client_stream(&client);
        assert!(client.nodelay().unwrap());
    }
}
