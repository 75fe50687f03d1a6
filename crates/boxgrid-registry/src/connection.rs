//! The per-connection lifecycle state machine.

use std::fmt;

/// The lifecycle state of one client connection.
///
/// Transitions are strictly ordered — no skipping, no going back:
///
/// ```text
/// Connecting → Active → Closing → Closed
/// ```
///
/// - **Connecting**: the socket is accepted but the connection isn't
///   registered yet (relay not started, counter not bumped).
/// - **Active**: registered; the read loop and relay are running.
/// - **Closing**: teardown has begun — the relay is being cancelled.
///   A connection can never become Active again from here.
/// - **Closed**: the relay is confirmed cancelled and the entry is
///   gone. Represented in the registry by the absence of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Active,
    Closing,
    Closed,
}

impl ConnectionState {
    /// Returns `true` if `next` is a legal successor of this state.
    pub fn can_become(self, next: ConnectionState) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Active)
                | (Self::Active, Self::Closing)
                | (Self::Closing, Self::Closed)
        )
    }

    /// Returns `true` if the connection is in service.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Active => "active",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        write!(f, "{name}")
    }
}
