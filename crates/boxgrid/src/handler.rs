//! Per-connection handling: the inbound read loop, the outbound relay,
//! and the single teardown path.
//!
//! Each accepted connection gets two Tokio tasks:
//!
//! - the **read loop** (this handler): receives 3-byte toggle frames,
//!   applies them to the shared canvas, republishes them on the bus;
//! - the **relay**: subscribed to the bus, forwards every payload to
//!   this connection's socket until cancelled.
//!
//! There is no handshake — a connection is live as soon as the
//! WebSocket upgrade completes. The connect sequence is: subscribe →
//! spawn relay → register → increment counter → publish the new player
//! count. Subscribing before the publish means the connecting client
//! observes its own count update.
//!
//! Teardown runs exactly once per connection no matter which path
//! triggers it (clean close, recv error, process shutdown): the
//! registry removal is idempotent, and everything else hangs off it.

use std::sync::Arc;

use boxgrid_protocol::{Frame, FrameKind, PAYLOAD_MAX};
use boxgrid_store::{BitStore, Bus, BusSubscription, Counter};
use boxgrid_transport::{Connection, ConnectionId, WebSocketConnection};

use crate::server::ServerState;
use crate::{AdminNotifier, BoxgridError};

/// Drop guard that tears down the connection when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since
/// `Drop` is synchronous, it spawns a fire-and-forget task for the
/// async teardown — which is safe to race, because teardown is
/// idempotent.
struct DisconnectGuard<S: BitStore, B: Bus, C: Counter, N: AdminNotifier> {
    conn_id: ConnectionId,
    state: Arc<ServerState<S, B, C, N>>,
}

impl<S: BitStore, B: Bus, C: Counter, N: AdminNotifier> Drop
    for DisconnectGuard<S, B, C, N>
{
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            disconnect(conn_id, state).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S, B, C, N>(
    conn: WebSocketConnection,
    state: Arc<ServerState<S, B, C, N>>,
) -> Result<(), BoxgridError>
where
    S: BitStore,
    B: Bus,
    C: Counter,
    N: AdminNotifier,
{
    let conn_id = conn.id();

    // --- Connect sequence ---

    // Without a bus subscription the client would never see anything;
    // if the backend is down at connect time, refuse the connection.
    let subscription = state.bus.subscribe().await?;

    let relay = tokio::spawn(relay_loop(subscription, conn.clone()));
    state.registry.register(conn_id, relay)?;

    // From here on, teardown is guaranteed — even on panic.
    let _guard = DisconnectGuard {
        conn_id,
        state: Arc::clone(&state),
    };

    // Count failure is non-fatal: the connection proceeds, the count
    // is stale until the next successful connect/disconnect.
    match state.counter.increment().await {
        Ok(count) => {
            publish_player_count(&state, count).await;
            state.notifier.player_joined(count).await;
        }
        Err(e) => {
            tracing::warn!(%conn_id, error = %e, "player count increment failed");
        }
    }

    tracing::info!(%conn_id, "client connected");

    // --- Read loop ---
    //
    // Frames from one socket are processed in receipt order. Nothing
    // in here breaks the loop except the socket itself going away.
    loop {
        match conn.recv().await {
            Ok(Some(data)) => handle_frame(&state, conn_id, &data).await,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        }
    }

    // _guard drops here → teardown fires.
    Ok(())
}

/// Processes one inbound message. Every failure mode is recovered
/// locally — the connection stays alive no matter what arrives.
async fn handle_frame<S, B, C, N>(
    state: &Arc<ServerState<S, B, C, N>>,
    conn_id: ConnectionId,
    data: &[u8],
) where
    S: BitStore,
    B: Bus,
    C: Counter,
    N: AdminNotifier,
{
    let frame = match Frame::decode(data) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(%conn_id, error = %e, "dropping malformed frame");
            return;
        }
    };

    // This is a toggle-only inbound channel. Other kinds are not a
    // protocol violation, they just have no meaning here.
    if frame.kind != FrameKind::Toggle {
        tracing::trace!(%conn_id, kind = %frame.kind, "ignoring inbound frame");
        return;
    }

    // The payload field can address 2^20 boxes; the canvas may be
    // configured smaller.
    if frame.payload >= state.canvas_bits {
        tracing::debug!(
            %conn_id,
            offset = frame.payload,
            "dropping toggle outside canvas"
        );
        return;
    }

    // Apply first, broadcast second: a toggle that didn't reach the
    // store must not be announced. No retry — the client's change is
    // simply lost (and invisible to them; there is no nack on the wire).
    if let Err(e) = state.store.set_bit(frame.payload, frame.flag).await {
        tracing::warn!(%conn_id, error = %e, "toggle dropped, store unavailable");
        return;
    }

    // Re-encoding a decoded frame reproduces the input bytes, so every
    // subscriber — the sender included — receives exactly what was sent.
    match frame.encode() {
        Ok(bytes) => {
            if let Err(e) = state.bus.publish(&bytes).await {
                tracing::warn!(
                    %conn_id,
                    error = %e,
                    "broadcast dropped, bus unavailable"
                );
            }
        }
        Err(e) => {
            // Decoded fields always fit their widths.
            tracing::error!(%conn_id, error = %e, "re-encode failed");
        }
    }
}

/// The outbound relay: forwards every bus payload to this socket.
///
/// Runs until cancelled by the registry (the normal case), or until
/// the socket or the subscription dies — after which the read loop
/// notices the broken socket and triggers the one teardown path.
async fn relay_loop(
    mut subscription: impl BusSubscription,
    conn: WebSocketConnection,
) {
    let conn_id = conn.id();
    loop {
        match subscription.recv().await {
            Ok(Some(payload)) => {
                if let Err(e) = conn.send(&payload).await {
                    tracing::debug!(%conn_id, error = %e, "relay send failed");
                    break;
                }
            }
            Ok(None) => {
                tracing::debug!(%conn_id, "bus subscription ended");
                break;
            }
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "bus receive failed");
                break;
            }
        }
    }
}

/// The single teardown path. Idempotent: the registry removal decides
/// whether there is anything left to do, so racing callers (read-loop
/// exit, drop guard, process shutdown) can't double-decrement.
async fn disconnect<S, B, C, N>(
    conn_id: ConnectionId,
    state: Arc<ServerState<S, B, C, N>>,
) where
    S: BitStore,
    B: Bus,
    C: Counter,
    N: AdminNotifier,
{
    if !state.registry.remove(conn_id) {
        return;
    }

    match state.counter.decrement().await {
        Ok(count) => {
            publish_player_count(&state, count).await;
            state.notifier.player_left(count).await;
        }
        Err(e) => {
            tracing::warn!(%conn_id, error = %e, "player count decrement failed");
        }
    }

    tracing::info!(%conn_id, "client disconnected");
}

/// Publishes a player-count frame carrying `count` to every process.
///
/// The count is clamped into the 20-bit payload range: a count that
/// drifted negative (lost decrements elsewhere in the fleet) reads as
/// zero on the wire.
async fn publish_player_count<S, B, C, N>(
    state: &Arc<ServerState<S, B, C, N>>,
    count: i64,
) where
    S: BitStore,
    B: Bus,
    C: Counter,
    N: AdminNotifier,
{
    let clamped = count.clamp(0, i64::from(PAYLOAD_MAX)) as u32;
    match Frame::player_count(clamped).encode() {
        Ok(bytes) => {
            if let Err(e) = state.bus.publish(&bytes).await {
                tracing::warn!(error = %e, "player count broadcast dropped");
            }
        }
        Err(e) => {
            // Clamped values always fit the payload field.
            tracing::error!(error = %e, "player count encode failed");
        }
    }
}
