//! `BroadcastServer` builder and accept loop.
//!
//! This is the entry point for running a Boxgrid server process. It
//! ties together all the layers: transport → protocol → registry →
//! shared store/bus/counter.

use std::sync::Arc;

use boxgrid_registry::ConnectionRegistry;
use boxgrid_store::{BitStore, Bus, Counter};
use boxgrid_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{AdminNotifier, BoxgridError};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// store, bus, and counter are atomic at the resource boundary; the
/// registry carries its own internal lock — so there is no outer
/// mutex here at all.
pub(crate) struct ServerState<S, B, C, N> {
    pub(crate) registry: ConnectionRegistry,
    pub(crate) store: S,
    pub(crate) bus: B,
    pub(crate) counter: C,
    pub(crate) notifier: N,
    /// Canvas size in bits. Inbound toggles at or beyond this offset
    /// are dropped before they reach the store.
    pub(crate) canvas_bits: u32,
}

/// Builder for configuring and starting a Boxgrid server.
///
/// # Example
///
/// ```rust,ignore
/// let server = BroadcastServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(store, bus, counter, notifier)
///     .await?;
/// server.run().await
/// ```
pub struct BroadcastServerBuilder {
    bind_addr: String,
    canvas_bits: u32,
}

impl BroadcastServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            canvas_bits: boxgrid_store::DEFAULT_CANVAS_BITS,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the canvas size in bits (defaults to the full 2^20).
    ///
    /// Tests shrink this to exercise the out-of-range drop path; it
    /// never needs to grow, since the 20-bit payload can't address
    /// more.
    pub fn canvas_bits(mut self, bits: u32) -> Self {
        self.canvas_bits = bits;
        self
    }

    /// Binds the listener and assembles the server.
    ///
    /// The store, bus, and counter are the process's handles to the
    /// shared backend; the notifier receives connect/disconnect
    /// events.
    pub async fn build<S, B, C, N>(
        self,
        store: S,
        bus: B,
        counter: C,
        notifier: N,
    ) -> Result<BroadcastServer<S, B, C, N>, BoxgridError>
    where
        S: BitStore,
        B: Bus,
        C: Counter,
        N: AdminNotifier,
    {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: ConnectionRegistry::new(),
            store,
            bus,
            counter,
            notifier,
            canvas_bits: self.canvas_bits,
        });

        Ok(BroadcastServer { transport, state })
    }
}

impl Default for BroadcastServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Boxgrid broadcast server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct BroadcastServer<S, B, C, N> {
    transport: WebSocketTransport,
    state: Arc<ServerState<S, B, C, N>>,
}

impl<S, B, C, N> BroadcastServer<S, B, C, N>
where
    S: BitStore,
    B: Bus,
    C: Counter,
    N: AdminNotifier,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each
    /// one. A failed accept is logged and the loop continues — one bad
    /// handshake never stops the listener. Runs until ctrl-c, then
    /// drains the registry (cancelling every relay) and returns.
    pub async fn run(mut self) -> Result<(), BoxgridError> {
        tracing::info!("Boxgrid server running");

        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) =
                                handle_connection(conn, state).await
                            {
                                tracing::debug!(
                                    error = %e,
                                    "connection ended with error"
                                );
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    let closed = self.state.registry.drain();
                    tracing::info!(closed, "shutdown requested, draining");
                    break;
                }
            }
        }

        Ok(())
    }
}
