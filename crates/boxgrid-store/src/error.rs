//! Error type for the shared-state layer.

/// Errors that can occur against a shared-state backend.
///
/// There is deliberately one variant: every failure mode of the store,
/// bus, or counter — connection refused, timeout, protocol error — is
/// recovered the same way by callers (log, drop the operation, carry
/// on), so they all collapse into `Unavailable`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or rejected the operation.
    ///
    /// The operation was not applied (single-bit writes never partially
    /// apply). Callers must not retry automatically.
    #[error("store backend unavailable: {0}")]
    Unavailable(String),
}
