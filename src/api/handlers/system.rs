//! System endpoints: health check and feed catalog.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::Feed;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    sessions: usize,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, live session count and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            sessions: state.sessions.registry().len().await,
        }),
    )
}

/// Listing feed info.
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedInfo {
    feed: &'static str,
    description: &'static str,
    status: String,
    order_by: String,
    order_direction: &'static str,
    limit: u32,
    refreshes: bool,
}

/// `GET /config/feeds` — List supported feeds.
#[utoipa::path(
    get,
    path = "/config/feeds",
    tag = "System",
    summary = "List listing feeds",
    description = "Returns every feed a session can be bound to, with its status filter, default order and page size.",
    responses(
        (status = 200, description = "Feed catalog", body = Vec<FeedInfo>),
    )
)]
pub async fn feeds_handler(State(state): State<AppState>) -> impl IntoResponse {
    let default_limit = state.sessions.settings().default_limit;
    let feeds: Vec<FeedInfo> = Feed::ALL
        .into_iter()
        .map(|feed| {
            let order = feed.default_order();
            FeedInfo {
                feed: feed.as_str(),
                description: feed.description(),
                status: feed.status().to_string(),
                order_by: order.field,
                order_direction: order.direction.as_str(),
                limit: feed.fixed_limit().unwrap_or(default_limit),
                refreshes: feed.refreshes(),
            }
        })
        .collect();
    (StatusCode::OK, Json(feeds))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/feeds", get(feeds_handler))
}
