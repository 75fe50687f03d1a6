//! REST endpoints: canvas snapshot, live player count, special boxes.
//!
//! These are thin reads over the shared backend — the broadcast path
//! never goes through HTTP. Failures map to a plain 500; the frontend
//! retries on its own schedule.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use boxgrid_store::{BitStore, Counter, RedisBackend};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// State shared by the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: RedisBackend,
    /// The special-boxes table, serialized once at startup.
    pub special_json: Arc<String>,
}

/// Builds the API router with the CORS policy applied.
pub fn router(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/boxes", get(get_boxes))
        .route("/api/players", get(get_players))
        .route("/api/special", get(get_special))
        .layer(cors)
        .with_state(state)
}

/// `GET /api/boxes` — the full canvas, packed bytes.
async fn get_boxes(State(state): State<AppState>) -> Response {
    match state.backend.snapshot().await {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "snapshot failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET /api/players` — the live player count as a JSON integer.
async fn get_players(State(state): State<AppState>) -> Response {
    match state.backend.get().await {
        Ok(count) => Json(count).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "player count read failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `GET /api/special` — the static offset → category table.
async fn get_special(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "application/json")],
        state.special_json.as_str().to_owned(),
    )
        .into_response()
}
