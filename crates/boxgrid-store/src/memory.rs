//! In-memory implementations of [`BitStore`], [`Bus`], and [`Counter`].
//!
//! Process-local stand-ins with the same observable semantics as the
//! Redis backend, for tests and single-process runs. "Shared" here
//! means shared between tasks, not between processes — which is exactly
//! what an integration test needs.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use tokio::sync::broadcast;

use crate::{BitStore, Bus, BusSubscription, Counter, StoreError};

/// Bus capacity. A subscriber that falls behind by more than this many
/// messages skips ahead (at-most-once delivery, like the real bus).
const BUS_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// MemoryBitStore
// ---------------------------------------------------------------------------

/// A canvas bitmap held in process memory.
pub struct MemoryBitStore {
    /// Packed canvas bytes. Bit `i` is the MSB-first bit `i % 8` of
    /// byte `i / 8`, matching the Redis bitmap addressing.
    bits: Mutex<Vec<u8>>,
}

impl MemoryBitStore {
    /// Creates a zeroed canvas of `canvas_bits` boxes.
    pub fn new(canvas_bits: u32) -> Self {
        Self {
            bits: Mutex::new(vec![0; (canvas_bits as usize).div_ceil(8)]),
        }
    }
}

impl BitStore for MemoryBitStore {
    async fn set_bit(
        &self,
        offset: u32,
        value: bool,
    ) -> Result<(), StoreError> {
        let mut bits = self.bits.lock().expect("canvas lock poisoned");
        let byte = offset as usize / 8;
        if byte >= bits.len() {
            // The Redis bitmap grows lazily on out-of-range writes;
            // mirror that so both backends accept the same offsets.
            bits.resize(byte + 1, 0);
        }
        let mask = 0x80u8 >> (offset % 8);
        if value {
            bits[byte] |= mask;
        } else {
            bits[byte] &= !mask;
        }
        Ok(())
    }

    async fn snapshot(&self) -> Result<Vec<u8>, StoreError> {
        Ok(self.bits.lock().expect("canvas lock poisoned").clone())
    }
}

// ---------------------------------------------------------------------------
// MemoryBus
// ---------------------------------------------------------------------------

/// A process-local bus over `tokio::sync::broadcast`.
///
/// Matches the bus contract: at-most-once (a lagged subscriber skips,
/// a payload published with no subscribers vanishes), FIFO per
/// publisher, prompt cancellation (dropping a subscription releases
/// its receiver).
pub struct MemoryBus {
    tx: broadcast::Sender<Vec<u8>>,
}

impl MemoryBus {
    /// Creates a bus with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(BUS_CAPACITY)
    }

    /// Creates a bus with an explicit capacity (tests shrink it to
    /// exercise lag behavior).
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for MemoryBus {
    type Subscription = MemoryBusSubscription;

    async fn publish(&self, payload: &[u8]) -> Result<(), StoreError> {
        // Send fails only when there are no subscribers — which is a
        // successful fire-and-forget publish, not an error.
        let _ = self.tx.send(payload.to_vec());
        Ok(())
    }

    async fn subscribe(&self) -> Result<Self::Subscription, StoreError> {
        Ok(MemoryBusSubscription {
            rx: self.tx.subscribe(),
        })
    }
}

/// A live receiver on a [`MemoryBus`].
pub struct MemoryBusSubscription {
    rx: broadcast::Receiver<Vec<u8>>,
}

impl BusSubscription for MemoryBusSubscription {
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, StoreError> {
        loop {
            match self.rx.recv().await {
                Ok(payload) => return Ok(Some(payload)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "bus subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Ok(None);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryCounter
// ---------------------------------------------------------------------------

/// A process-local live counter.
pub struct MemoryCounter {
    value: AtomicI64,
}

impl MemoryCounter {
    /// Creates a counter starting at zero.
    pub fn new() -> Self {
        Self {
            value: AtomicI64::new(0),
        }
    }
}

impl Default for MemoryCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Counter for MemoryCounter {
    async fn increment(&self) -> Result<i64, StoreError> {
        Ok(self.value.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn decrement(&self) -> Result<i64, StoreError> {
        Ok(self.value.fetch_sub(1, Ordering::SeqCst) - 1)
    }

    async fn reset(&self, value: i64) -> Result<(), StoreError> {
        self.value.store(value, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self) -> Result<i64, StoreError> {
        Ok(self.value.load(Ordering::SeqCst))
    }
}

// =========================================================================
// Tests
// =========================================================================
