//! HTTP surface for the dashboard: read-side payloads plus the manual
//! refresh trigger. Refresh runs behind a single-flight guard; the engine
//! requires at most one in-flight run per store and this layer enforces it.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::collect::CollectionEngine;
use crate::query::{
    build_feed_payload, build_history_payload, build_meta_payload, FeedQuery, HistoryQuery,
};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<CollectionEngine>,
    /// Shared with the background scheduler so manual and scheduled runs
    /// never overlap.
    pub refresh_lock: Arc<Mutex<()>>,
}

pub fn create_router(engine: Arc<CollectionEngine>, refresh_lock: Arc<Mutex<()>>) -> Router {
    let state = AppState {
        engine,
        refresh_lock,
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/feed", get(feed))
        .route("/api/meta", get(meta))
        .route("/api/history", get(history))
        .route("/api/refresh", post(refresh))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn internal_error(err: anyhow::Error) -> Response {
    tracing::error!(error = %err, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "ok": false, "error": err.to_string() })),
    )
        .into_response()
}

async fn feed(State(state): State<AppState>, Query(query): Query<FeedQuery>) -> Response {
    match state.engine.load_store() {
        Ok(store) => Json(build_feed_payload(
            &store,
            &query,
            state.engine.config().min_confidence,
        ))
        .into_response(),
        Err(err) => internal_error(err),
    }
}

async fn meta(State(state): State<AppState>) -> Response {
    match state.engine.load_store() {
        Ok(store) => Json(build_meta_payload(&store, state.engine.config())).into_response(),
        Err(err) => internal_error(err),
    }
}

async fn history(State(state): State<AppState>, Query(query): Query<HistoryQuery>) -> Response {
    match state.engine.load_store() {
        Ok(store) => Json(build_history_payload(&store, &query)).into_response(),
        Err(err) => internal_error(err),
    }
}

async fn refresh(State(state): State<AppState>) -> Response {
    // Single-flight: a second request while a run is in flight is refused,
    // not queued.
    let Ok(_guard) = state.refresh_lock.try_lock() else {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "ok": false, "error": "refresh already running" })),
        )
            .into_response();
    };

    match state.engine.run_collection().await {
        Ok(summary) => Json(json!({ "ok": true, "summary": summary })).into_response(),
        Err(err) => internal_error(err),
    }
}
