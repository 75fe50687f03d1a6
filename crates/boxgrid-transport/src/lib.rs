//! Transport abstraction layer for Boxgrid.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract
//! over the network protocol carrying frames. The broadcast server
//! only ever sees "a stream of binary messages with an identity" —
//! which protocol delivers them is this crate's business.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Opaque identifier for a connection.
///
/// Unique within one server process for its lifetime; never reused.
/// The registry keys its bookkeeping on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Returns the local address the transport is bound to.
    ///
    /// Needed when binding to port 0 (tests bind `127.0.0.1:0` and ask
    /// the OS which port was assigned).
    fn local_addr(&self) -> std::io::Result<std::net::SocketAddr>;
}

/// A single connection that can send and receive binary messages.
///
/// Implementations are cheaply cloneable handles to one underlying
/// socket: the server's read loop and the connection's relay task each
/// hold a clone of the same connection.
pub trait Connection: Clone + Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends a binary message to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next binary message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
