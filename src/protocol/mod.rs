//! Ingestion wire protocol
//!
//! Clients send JSON objects over raw TCP; the server answers each one with
//! a single JSON line. See [`framing`] for how values are cut from the byte
//! stream.

pub mod framing;
mod message;

pub use framing::{Frame, MessageFramer};
pub use message::{ClientMessage, EventPayload, MONITOR_KEY, Reply, StatusSnapshot};
