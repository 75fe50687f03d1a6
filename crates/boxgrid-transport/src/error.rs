/// Errors that can occur in the transport layer.
///
/// Any of these on a live connection is treated uniformly by the
/// server as a disconnect trigger for that one connection — they never
/// propagate past it.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),
}
