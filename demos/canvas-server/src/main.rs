//! Canvas server: the deployable Boxgrid service.
//!
//! One process runs two listeners against one shared Redis backend:
//!
//! - the WebSocket broadcast server (toggles in, fanout out);
//! - the REST endpoints (canvas snapshot, live count, special boxes).
//!
//! Any number of these processes can run side by side — all shared
//! state lives in Redis, the processes never talk to each other
//! directly.

use std::sync::Arc;

use boxgrid::BroadcastServerBuilder;
use boxgrid_store::{Counter, RedisBackend, RedisConfig};
use tracing_subscriber::EnvFilter;

mod config;
mod http;
mod notify;
mod special;

use config::ServiceConfig;
use notify::AdminWebhook;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_env();
    tracing::info!(
        ws_addr = %config.ws_addr,
        http_addr = %config.http_addr,
        "starting canvas server"
    );

    let backend =
        RedisBackend::connect(&config.redis_url, RedisConfig::default())
            .await?;

    // Cold-start hook: one logical reset of the live count, before any
    // listener accepts traffic. With several replicas this belongs in
    // a one-shot bootstrap job instead — each replica resetting on its
    // own startup would zero a live count.
    backend.reset(0).await?;

    // The special-boxes table: generated once, served unmodified.
    let special = special::generate_table(special::SPECIAL_COUNT);
    let special_json = Arc::new(serde_json::to_string(&special)?);
    tracing::info!(count = special.len(), "special boxes generated");

    // REST listener.
    let app_state = http::AppState {
        backend: backend.clone(),
        special_json,
    };
    let router = http::router(app_state, &config.allowed_origins);
    let listener =
        tokio::net::TcpListener::bind(&config.http_addr).await?;
    tracing::info!(addr = %config.http_addr, "HTTP endpoints listening");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "HTTP server failed");
        }
    });

    // WebSocket broadcast server; runs until ctrl-c.
    let notifier = AdminWebhook::new(config.admin_webhook.clone());
    let server = BroadcastServerBuilder::new()
        .bind(&config.ws_addr)
        .build(backend.clone(), backend.clone(), backend, notifier)
        .await?;
    server.run().await?;

    Ok(())
}
