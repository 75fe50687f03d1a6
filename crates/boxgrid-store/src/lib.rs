//! Shared-state interfaces for Boxgrid.
//!
//! Server processes are stateless replicas: every piece of state that
//! must survive a process or be seen by another one lives behind the
//! three traits in this crate.
//!
//! - [`BitStore`] — the shared canvas of boxes (one bit each).
//! - [`Bus`] — fire-and-forget pub/sub fanning frames out to every
//!   process.
//! - [`Counter`] — the live player count.
//!
//! All three are atomic at the resource boundary, so callers need no
//! process-local locking around them.
//!
//! # Backends
//!
//! - `redis` feature (default) — [`RedisBackend`], one type implementing
//!   all three traits against a shared Redis: the canvas is a bitmap
//!   (`BITFIELD ... SET u1`), the bus is a pub/sub channel, the counter
//!   is an `INCR`/`DECR` integer.
//! - `memory` feature (default) — [`MemoryBitStore`], [`MemoryBus`],
//!   [`MemoryCounter`]: process-local equivalents for tests and
//!   single-process runs.
//!
//! # Why `impl Future + Send` instead of `async fn`?
//!
//! These futures cross `tokio::spawn` boundaries (the relay task holds
//! a bus subscription), so they must be provably `Send`. A plain
//! `async fn` in a trait doesn't promise that to generic callers.

use std::future::Future;

mod error;
#[cfg(feature = "memory")]
mod memory;
#[cfg(feature = "redis")]
mod redis_backend;

pub use error::StoreError;
#[cfg(feature = "memory")]
pub use memory::{MemoryBitStore, MemoryBus, MemoryCounter};
#[cfg(feature = "redis")]
pub use redis_backend::{RedisBackend, RedisConfig};

/// Number of boxes on the full-size canvas: 2^20, the largest offset
/// space the 20-bit frame payload can address.
pub const DEFAULT_CANVAS_BITS: u32 = 1 << 20;

// ---------------------------------------------------------------------------
// BitStore
// ---------------------------------------------------------------------------

/// A shared, byte-addressable bit array: the box canvas.
///
/// No process holds an authoritative in-memory copy — every toggle is a
/// read-modify-write against the store, and every full read is a store
/// snapshot.
pub trait BitStore: Send + Sync + 'static {
    /// Atomically writes a single bit at `offset`.
    ///
    /// The write is single-bit addressed: a failure must never touch
    /// adjacent boxes. Callers are responsible for range-checking
    /// `offset` against the canvas size.
    ///
    /// # Errors
    /// [`StoreError::Unavailable`] on backend failure. The caller
    /// decides whether to retry; this method never retries itself.
    fn set_bit(
        &self,
        offset: u32,
        value: bool,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Reads the full canvas as packed bytes.
    ///
    /// Bit `i` is addressed MSB-first within byte `i / 8` (the same
    /// addressing Redis uses for bitmaps). The result is always the
    /// full canvas length, zero-padded if the backend has grown the
    /// value lazily.
    ///
    /// # Errors
    /// [`StoreError::Unavailable`] on backend failure.
    fn snapshot(
        &self,
    ) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send;
}

// ---------------------------------------------------------------------------
// Bus
// ---------------------------------------------------------------------------

/// A live subscription to the bus.
///
/// Dropping the subscription (or aborting the task that owns it)
/// releases the underlying channel resource; a pending `recv` is
/// interrupted promptly at its await point.
pub trait BusSubscription: Send + 'static {
    /// Waits for the next published payload.
    ///
    /// Returns `Ok(None)` when the channel is closed for good. A
    /// subscriber that falls behind may skip messages — delivery is
    /// at-most-once, never buffered durably.
    fn recv(
        &mut self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, StoreError>> + Send;
}

/// Process-wide publish/subscribe channel for broadcast frames.
///
/// Delivery is best-effort, at-most-once, fire-and-forget: no acks, no
/// persistence, no ordering across publishers. A single publisher's
/// messages reach any one subscriber in publish order.
pub trait Bus: Send + Sync + 'static {
    /// The subscription type produced by [`subscribe`](Self::subscribe).
    type Subscription: BusSubscription;

    /// Publishes a payload to all current subscribers.
    ///
    /// # Errors
    /// [`StoreError::Unavailable`] on backend failure. A payload
    /// published while a subscriber is momentarily disconnected is
    /// lost to that subscriber — that is not an error here.
    fn publish(
        &self,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Opens a new subscription receiving every payload published
    /// after this point.
    fn subscribe(
        &self,
    ) -> impl Future<Output = Result<Self::Subscription, StoreError>> + Send;
}

// ---------------------------------------------------------------------------
// Counter
// ---------------------------------------------------------------------------

/// An atomically incrementable shared integer: the live player count.
///
/// Backend failures are non-fatal to callers — a connection proceeds
/// with a stale count — but should be logged.
pub trait Counter: Send + Sync + 'static {
    /// Atomically adds one; returns the post-operation value.
    fn increment(
        &self,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send;

    /// Atomically subtracts one; returns the post-operation value.
    fn decrement(
        &self,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send;

    /// Sets the counter unconditionally.
    ///
    /// Used exactly once, at service cold start, before connections
    /// are accepted — never during steady-state operation.
    fn reset(
        &self,
        value: i64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Point-in-time read of the current value.
    fn get(&self) -> impl Future<Output = Result<i64, StoreError>> + Send;
}

// ---------------------------------------------------------------------------
// Arc forwarding
// ---------------------------------------------------------------------------

// The server, the HTTP layer, and tests often share one backend
// instance; `Arc<T>` implementing the traits lets them hold clones of
// the same handle without the backend itself being `Clone`.

impl<T: BitStore> BitStore for std::sync::Arc<T> {
    fn set_bit(
        &self,
        offset: u32,
        value: bool,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        T::set_bit(self, offset, value)
    }

    fn snapshot(
        &self,
    ) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send {
        T::snapshot(self)
    }
}

impl<T: Bus> Bus for std::sync::Arc<T> {
    type Subscription = T::Subscription;

    fn publish(
        &self,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        T::publish(self, payload)
    }

    fn subscribe(
        &self,
    ) -> impl Future<Output = Result<Self::Subscription, StoreError>> + Send
    {
        T::subscribe(self)
    }
}

impl<T: Counter> Counter for std::sync::Arc<T> {
    fn increment(
        &self,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send {
        T::increment(self)
    }

    fn decrement(
        &self,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send {
        T::decrement(self)
    }

    fn reset(
        &self,
        value: i64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        T::reset(self, value)
    }

    fn get(&self) -> impl Future<Output = Result<i64, StoreError>> + Send {
        T::get(self)
    }
}
