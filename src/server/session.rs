//! One client connection
//!
//! Reads bytes, cuts them into messages and answers each one in order. Event
//! writes are spawned onto the worker runtime and never awaited here.

use anyhow::{Context, Result};
use chrono::Utc;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::constants::buffer::READ_CHUNK;
use crate::counters::ServerCounters;
use crate::normalize::normalize_event;
use crate::pool::{Connector, ResourcePool};
use crate::protocol::{ClientMessage, Frame, MessageFramer, Reply, StatusSnapshot};
use crate::types::ClientId;

pub(super) struct Session<C: Connector> {
    id: ClientId,
    peer: SocketAddr,
    pool: ResourcePool<C>,
    counters: ServerCounters,
}

impl<C: Connector> Session<C> {
    pub(super) fn new(peer: SocketAddr, pool: ResourcePool<C>, counters: ServerCounters) -> Self {
        Self {
            id: ClientId::new(),
            peer,
            pool,
            counters,
        }
    }

    /// Serve the connection until the client closes it or shutdown is signalled
    pub(super) async fn run(
        self,
        mut stream: TcpStream,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let _guard = self.counters.client_connected();
        debug!(client = %self.peer, session = %self.id, "Client connected");

        let mut framer = MessageFramer::default();
        let mut buf = vec![0u8; READ_CHUNK];
        let mut out = Vec::new();

        loop {
            let n = tokio::select! {
                read = stream.read(&mut buf) => {
                    read.with_context(|| format!("Failed to read from client {}", self.peer))?
                }
                _ = shutdown.wait_for(|&stop| stop) => {
                    debug!(client = %self.peer, session = %self.id, "Closing session for shutdown");
                    break;
                }
            };
            if n == 0 {
                break;
            }

            out.clear();
            for frame in framer.push(&buf[..n]) {
                if frame == Frame::Malformed {
                    debug!(client = %self.peer, session = %self.id, "Malformed message");
                }
                let reply = self.dispatch(ClientMessage::from_frame(frame));
                out.extend_from_slice(&reply.encode()?);
            }
            if !out.is_empty() {
                stream
                    .write_all(&out)
                    .await
                    .with_context(|| format!("Failed to reply to client {}", self.peer))?;
            }
        }

        debug!(client = %self.peer, session = %self.id, "Client disconnected");
        Ok(())
    }

    /// Handle one message and produce its reply without waiting on storage
    fn dispatch(&self, message: ClientMessage) -> Reply {
        match message {
            ClientMessage::StatusProbe => {
                trace!(client = %self.peer, "Status probe");
                Reply::Status(StatusSnapshot::new(
                    self.counters.snapshot(),
                    self.pool.connection_count(),
                ))
            }
            ClientMessage::Event(payload) => {
                self.counters.message_received();
                let record = normalize_event(payload.as_raw(), Utc::now());
                let pool = self.pool.clone();
                tokio::spawn(async move {
                    pool.save_record(&record).await;
                });
                Reply::Ack
            }
        }
    }
}
