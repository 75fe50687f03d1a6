//! Unified error type for the Boxgrid server.

use boxgrid_protocol::ProtocolError;
use boxgrid_registry::RegistryError;
use boxgrid_store::StoreError;
use boxgrid_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `boxgrid` crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
///
/// Note the scope: these errors surface only from server setup and
/// per-connection handlers. Inside a running handler, every error is
/// recovered locally (message dropped, toggle lost, or connection torn
/// down) — nothing here ever takes down another connection or the
/// process.
#[derive(Debug, thiserror::Error)]
pub enum BoxgridError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (frame encode/decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A shared-state backend error (canvas, bus, counter).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A registry-level error (duplicate registration).
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
