//! Connection bookkeeping for Boxgrid.
//!
//! This crate tracks the live client connections of one server process
//! and owns each connection's background relay task:
//!
//! 1. **Lifecycle** — every connection walks the same state machine
//!    ([`ConnectionState`]), and can never re-enter service once it
//!    starts closing.
//! 2. **Relay ownership** — the registry is the sole owner of the
//!    mapping from a connection to its relay task. Only the registry
//!    cancels a relay, so the task handle can't be double-freed from
//!    racing teardown paths.
//! 3. **Idempotent teardown** — removing a connection twice is a
//!    no-op, not an error. Disconnect sequences may be triggered from
//!    several failure paths; whichever gets there first wins.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)      ← registers on accept, removes on disconnect
//!     ↕
//! Registry (this crate) ← owns ConnectionId → relay-task map
//!     ↕
//! Transport (below)   ← provides ConnectionId
//! ```

mod connection;
mod error;
mod registry;

pub use connection::ConnectionState;
pub use error::RegistryError;
pub use registry::ConnectionRegistry;
