//! # Boxgrid
//!
//! Real-time shared-canvas broadcast server: a very large array of
//! binary boxes shared by every connected client, across any number of
//! stateless server replicas.
//!
//! A client toggles a box by sending one 3-byte frame. The server
//! applies the toggle to the shared canvas, then republishes the same
//! bytes on the process-spanning bus; every replica's per-connection
//! relays deliver it to their local sockets — including the sender's
//! own, which observes its toggle like any other client.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use boxgrid::{BroadcastServerBuilder, NoopNotifier};
//! use boxgrid_store::{MemoryBitStore, MemoryBus, MemoryCounter};
//!
//! # async fn run() -> Result<(), boxgrid::BoxgridError> {
//! let server = BroadcastServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build(
//!         MemoryBitStore::new(boxgrid_store::DEFAULT_CANVAS_BITS),
//!         MemoryBus::new(),
//!         MemoryCounter::new(),
//!         NoopNotifier,
//!     )
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod notify;
mod server;

pub use error::BoxgridError;
pub use notify::{AdminNotifier, NoopNotifier};
pub use server::{BroadcastServer, BroadcastServerBuilder};
