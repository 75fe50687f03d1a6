//! Wire protocol for Boxgrid.
//!
//! This crate defines the "language" that clients and servers speak:
//! a single 3-byte [`Frame`] carrying either a box toggle or a
//! player-count notification. The same bytes travel on the client
//! WebSocket and on the inter-process broadcast bus — there is no
//! re-encoding between the two.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the
//! server (connection context). It doesn't know about sockets, Redis,
//! or registries — it only knows how to pack and unpack 24 bits.
//!
//! ```text
//! Transport (bytes) → Protocol (Frame) → Server (store + bus)
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod error;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use error::ProtocolError;
pub use types::{Frame, FrameKind, FRAME_LEN, PAYLOAD_MAX};
