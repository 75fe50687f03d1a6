//! The connection registry: tracks live connections and owns their
//! relay tasks.
//!
//! # Concurrency note
//!
//! Connects and disconnects arrive from independently scheduled tasks,
//! so the map is guarded by an internal mutex. It's a `std` mutex, not
//! a Tokio one: every critical section is a plain map operation with
//! no await inside, so holding it across a suspension point can't
//! happen by construction.

use std::collections::HashMap;
use std::sync::Mutex;

use boxgrid_transport::ConnectionId;
use tokio::task::JoinHandle;

use crate::{ConnectionState, RegistryError};

/// One registered connection: its lifecycle state and the relay task
/// that forwards bus frames to its socket.
struct RegistryEntry {
    state: ConnectionState,
    relay: JoinHandle<()>,
}

/// Tracks every live connection of this process.
///
/// The registry is the sole owner of each connection's relay
/// [`JoinHandle`]; only [`remove`](ConnectionRegistry::remove) and
/// [`drain`](ConnectionRegistry::drain) ever cancel one. Removal is
/// idempotent — whichever teardown path runs first does the work, and
/// later callers find nothing to do.
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, RegistryEntry>>,
}

impl ConnectionRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Registers an accepted connection with its running relay task.
    /// The connection enters [`ConnectionState::Active`].
    ///
    /// # Errors
    /// Returns [`RegistryError::AlreadyRegistered`] if the ID is
    /// already present. The incoming relay is cancelled in that case —
    /// the registry owns every handle passed to it, stored or not.
    pub fn register(
        &self,
        id: ConnectionId,
        relay: JoinHandle<()>,
    ) -> Result<(), RegistryError> {
        let mut connections =
            self.connections.lock().expect("registry lock poisoned");
        if connections.contains_key(&id) {
            relay.abort();
            return Err(RegistryError::AlreadyRegistered(id));
        }
        connections.insert(
            id,
            RegistryEntry {
                state: ConnectionState::Active,
                relay,
            },
        );
        tracing::debug!(%id, "connection registered");
        Ok(())
    }

    /// Tears down a connection: cancels its relay task and removes the
    /// entry. Returns `true` if this call did the teardown, `false` if
    /// the connection was already gone (idempotent no-op).
    ///
    /// Cancellation is prompt — `abort` interrupts the relay at its
    /// pending bus receive, and dropping the task releases the
    /// subscription.
    pub fn remove(&self, id: ConnectionId) -> bool {
        let entry = {
            let mut connections =
                self.connections.lock().expect("registry lock poisoned");
            connections.remove(&id)
        };
        let Some(mut entry) = entry else {
            tracing::debug!(%id, "remove on unknown connection (no-op)");
            return false;
        };

        entry.state = ConnectionState::Closing;
        entry.relay.abort();
        // Dropping the entry is the Closed state: the ID can never
        // re-enter Active because register() refuses duplicates and
        // transport IDs are never reused.
        tracing::debug!(%id, "connection closed");
        true
    }

    /// Tears down every connection (process shutdown). Returns how
    /// many were closed.
    pub fn drain(&self) -> usize {
        let entries: Vec<(ConnectionId, RegistryEntry)> = {
            let mut connections =
                self.connections.lock().expect("registry lock poisoned");
            connections.drain().collect()
        };
        let count = entries.len();
        for (id, mut entry) in entries {
            entry.state = ConnectionState::Closing;
            entry.relay.abort();
            tracing::debug!(%id, "connection closed (drain)");
        }
        if count > 0 {
            tracing::info!(count, "registry drained");
        }
        count
    }

    /// Returns the connection's current state, or `None` once it is
    /// closed (removed).
    pub fn state(&self, id: ConnectionId) -> Option<ConnectionState> {
        self.connections
            .lock()
            .expect("registry lock poisoned")
            .get(&id)
            .map(|entry| entry.state)
    }

    /// A point-in-time snapshot of the registered connection IDs.
    ///
    /// Callers iterate the snapshot, never the live map — the map may
    /// be mutated by other tasks while they work through it.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections
            .lock()
            .expect("registry lock poisoned")
            .keys()
            .copied()
            .collect()
    }

    /// Returns the number of registered connections.
    pub fn len(&self) -> usize {
        self.connections
            .lock()
            .expect("registry lock poisoned")
            .len()
    }

    /// Returns `true` if no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
