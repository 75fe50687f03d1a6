//! Redis implementations of [`BitStore`], [`Bus`], and [`Counter`].
//!
//! One Redis deployment carries all three shared resources:
//!
//! - the canvas is a bitmap under one key, written with
//!   `BITFIELD <key> SET u1 <offset> <value>` (single-bit addressed,
//!   atomic, grows the value lazily) and read whole with `GET`;
//! - the bus is a pub/sub channel (fire-and-forget by construction —
//!   Redis pub/sub keeps nothing for absent subscribers);
//! - the counter is a plain integer key driven by `INCR`/`DECR`.
//!
//! Commands go through a [`ConnectionManager`], which multiplexes and
//! reconnects under the hood. Each bus subscription gets its own
//! dedicated pub/sub connection, because a Redis connection in
//! subscriber mode cannot issue regular commands.

use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::{BitStore, Bus, BusSubscription, Counter, StoreError};

/// Keys and sizing for the Redis backend.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Key holding the canvas bitmap.
    pub canvas_key: String,
    /// Key holding the live player count.
    pub counter_key: String,
    /// Pub/sub channel carrying broadcast frames.
    pub channel: String,
    /// Canvas size in bits; snapshots are padded to this length.
    pub canvas_bits: u32,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            canvas_key: "boxes".to_string(),
            counter_key: "players".to_string(),
            channel: "boxgrid:frames".to_string(),
            canvas_bits: crate::DEFAULT_CANVAS_BITS,
        }
    }
}

/// A Redis-backed store, bus, and counter in one handle.
///
/// Cloning is cheap (the connection manager is a shared handle) — the
/// server, the relay spawner, and the HTTP layer can all hold one.
#[derive(Clone)]
pub struct RedisBackend {
    client: redis::Client,
    conn: ConnectionManager,
    config: RedisConfig,
}

impl RedisBackend {
    /// Connects to Redis at `url` (e.g. `redis://127.0.0.1/`).
    ///
    /// # Errors
    /// [`StoreError::Unavailable`] if the URL is invalid or the initial
    /// connection fails.
    pub async fn connect(
        url: &str,
        config: RedisConfig,
    ) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(unavailable)?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(unavailable)?;
        tracing::info!(url, "connected to Redis backend");
        Ok(Self {
            client,
            conn,
            config,
        })
    }

    /// The configuration this backend was built with.
    pub fn config(&self) -> &RedisConfig {
        &self.config
    }
}

impl BitStore for RedisBackend {
    async fn set_bit(
        &self,
        offset: u32,
        value: bool,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        // BITFIELD SET u1 addresses a single bit; neighbors are never
        // touched, and a failed command applies nothing.
        let _: Vec<i64> = redis::cmd("BITFIELD")
            .arg(&self.config.canvas_key)
            .arg("SET")
            .arg("u1")
            .arg(offset)
            .arg(u8::from(value))
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn snapshot(&self) -> Result<Vec<u8>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<Vec<u8>> = conn
            .get(&self.config.canvas_key)
            .await
            .map_err(unavailable)?;
        // Redis grows the bitmap lazily; pad to the full canvas so
        // callers can index any box without length checks.
        let len = (self.config.canvas_bits as usize).div_ceil(8);
        let mut bytes = raw.unwrap_or_default();
        bytes.resize(len, 0);
        Ok(bytes)
    }
}

impl Counter for RedisBackend {
    async fn increment(&self) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        conn.incr(&self.config.counter_key, 1)
            .await
            .map_err(unavailable)
    }

    async fn decrement(&self) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        conn.decr(&self.config.counter_key, 1)
            .await
            .map_err(unavailable)
    }

    async fn reset(&self, value: i64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        conn.set(&self.config.counter_key, value)
            .await
            .map_err(unavailable)
    }

    async fn get(&self) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<i64> = conn
            .get(&self.config.counter_key)
            .await
            .map_err(unavailable)?;
        Ok(value.unwrap_or(0))
    }
}

impl Bus for RedisBackend {
    type Subscription = RedisSubscription;

    async fn publish(&self, payload: &[u8]) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .publish(&self.config.channel, payload)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn subscribe(&self) -> Result<Self::Subscription, StoreError> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(unavailable)?;
        pubsub
            .subscribe(&self.config.channel)
            .await
            .map_err(unavailable)?;
        Ok(RedisSubscription {
            messages: Box::pin(pubsub.into_on_message()),
        })
    }
}

/// A dedicated pub/sub connection receiving broadcast frames.
///
/// Dropping it closes the connection and unsubscribes.
pub struct RedisSubscription {
    messages: Pin<Box<dyn Stream<Item = redis::Msg> + Send>>,
}

impl BusSubscription for RedisSubscription {
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, StoreError> {
        match self.messages.next().await {
            Some(msg) => Ok(Some(msg.get_payload_bytes().to_vec())),
            // Stream end means the pub/sub connection is gone; the
            // relay treats this as a closed subscription.
            None => Ok(None),
        }
    }
}

fn unavailable(e: redis::RedisError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}
