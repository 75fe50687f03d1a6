//! Error types for the registry layer.

use boxgrid_transport::ConnectionId;

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The connection is already registered.
    ///
    /// Connection IDs are never reused, so this indicates a server bug
    /// (two handlers for one socket), not a client condition.
    #[error("connection {0} already registered")]
    AlreadyRegistered(ConnectionId),
}
