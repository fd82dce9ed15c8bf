//! Listing session handlers: create, list, get, dispose, navigate, filter.
//!
//! Navigation endpoints always answer 200 with the resulting snapshot;
//! fetch failures show up in its `error` field.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CreateSessionRequest, CreateSessionResponse, ListSessionsParams, ListingSnapshotDto,
    NextPageParams, SessionListResponse, SessionSummaryDto, UpdateFilterRequest,
};
use crate::app_state::AppState;
use crate::domain::{Feed, SessionId};
use crate::error::{ErrorResponse, GatewayError};
use crate::service::ListingSession;

fn parse_feed(name: &str) -> Result<Feed, GatewayError> {
    name.parse::<Feed>().map_err(GatewayError::InvalidFeed)
}

async fn lookup(state: &AppState, id: uuid::Uuid) -> Result<Arc<ListingSession>, GatewayError> {
    state.sessions.session(SessionId::from_uuid(id)).await
}

/// `POST /sessions` — Create a listing session.
///
/// # Errors
///
/// Returns [`GatewayError`] for an unknown feed, an invalid limit, or
/// when the session limit is reached.
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    tag = "Sessions",
    summary = "Create a listing session",
    description = "Creates an idle listing bound to a feed. Nothing is fetched until the first reload. Raising feeds start refreshing their loaded items immediately.",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created", body = CreateSessionResponse),
        (status = 400, description = "Unknown feed or invalid limit", body = ErrorResponse),
        (status = 409, description = "Session limit reached", body = ErrorResponse),
    )
)]
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let feed = parse_feed(&req.feed)?;
    let session = state.sessions.create_session(feed, req.limit).await?;
    let snapshot = session.listing().snapshot().await;

    let response = CreateSessionResponse {
        session_id: *session.id().as_uuid(),
        feed: feed.to_string(),
        limit: snapshot.query.limit,
        refreshing: session.is_refreshing().await,
        created_at: session.created_at(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /sessions` — List live sessions.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidFeed`] for an unknown feed filter.
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    tag = "Sessions",
    summary = "List sessions",
    description = "Returns every live listing session, optionally restricted to one feed.",
    params(ListSessionsParams),
    responses(
        (status = 200, description = "Session list", body = SessionListResponse),
        (status = 400, description = "Unknown feed", body = ErrorResponse),
    )
)]
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(params): Query<ListSessionsParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let feed = params.feed.as_deref().map(parse_feed).transpose()?;
    let data: Vec<SessionSummaryDto> = state
        .sessions
        .list_sessions(feed)
        .await
        .into_iter()
        .map(SessionSummaryDto::from)
        .collect();
    let total = data.len();
    Ok(Json(SessionListResponse { data, total }))
}

/// `GET /sessions/{id}` — Current snapshot of a session.
///
/// # Errors
///
/// Returns [`GatewayError::SessionNotFound`] for an unknown session.
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{id}",
    tag = "Sessions",
    summary = "Get session snapshot",
    params(("id" = uuid::Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Listing snapshot", body = ListingSnapshotDto),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let session = lookup(&state, id).await?;
    let snapshot = session.listing().snapshot().await;
    Ok(Json(ListingSnapshotDto::new(session.id(), session.feed(), &snapshot)))
}

/// `DELETE /sessions/{id}` — Dispose a session and stop its refresh loop.
///
/// # Errors
///
/// Returns [`GatewayError::SessionNotFound`] for an unknown session.
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{id}",
    tag = "Sessions",
    summary = "Dispose session",
    params(("id" = uuid::Uuid, Path, description = "Session identifier")),
    responses(
        (status = 204, description = "Session disposed"),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    state.sessions.dispose_session(SessionId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /sessions/{id}/reload` — Reload from the first page.
///
/// # Errors
///
/// Returns [`GatewayError::SessionNotFound`] for an unknown session.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/reload",
    tag = "Sessions",
    summary = "Reload first page",
    params(("id" = uuid::Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Snapshot after the fetch", body = ListingSnapshotDto),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn reload_page(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let session = lookup(&state, id).await?;
    let snapshot = session.listing().reload_page().await;
    Ok(Json(ListingSnapshotDto::new(session.id(), session.feed(), &snapshot)))
}

/// `POST /sessions/{id}/next` — Load the next page.
///
/// # Errors
///
/// Returns [`GatewayError`] for an unknown session or page mode.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/next",
    tag = "Sessions",
    summary = "Load next page",
    description = "Appends (infinite scroll) or replaces (numbered pages) the loaded items with the next page. A no-op without a next page or while a fetch is in flight.",
    params(("id" = uuid::Uuid, Path, description = "Session identifier"), NextPageParams),
    responses(
        (status = 200, description = "Snapshot after the fetch", body = ListingSnapshotDto),
        (status = 400, description = "Unknown page mode", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn next_page(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<NextPageParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let mode = params.page_mode()?;
    let session = lookup(&state, id).await?;
    let snapshot = session.listing().next_page(mode).await;
    Ok(Json(ListingSnapshotDto::new(session.id(), session.feed(), &snapshot)))
}

/// `POST /sessions/{id}/prev` — Load the previous page.
///
/// # Errors
///
/// Returns [`GatewayError::SessionNotFound`] for an unknown session.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/prev",
    tag = "Sessions",
    summary = "Load previous page",
    params(("id" = uuid::Uuid, Path, description = "Session identifier")),
    responses(
        (status = 200, description = "Snapshot after the fetch", body = ListingSnapshotDto),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn prev_page(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let session = lookup(&state, id).await?;
    let snapshot = session.listing().prev_page().await;
    Ok(Json(ListingSnapshotDto::new(session.id(), session.feed(), &snapshot)))
}

/// `POST /sessions/{id}/filter` — Merge filter, search and sort changes.
///
/// # Errors
///
/// Returns [`GatewayError`] for an unknown session, an invalid sort, or
/// an invalid limit.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{id}/filter",
    tag = "Sessions",
    summary = "Update filter",
    description = "Merges the given criteria into the active filter and reloads from the first page. Empty values clear a key; unknown keys and malformed values are ignored.",
    params(("id" = uuid::Uuid, Path, description = "Session identifier")),
    request_body = UpdateFilterRequest,
    responses(
        (status = 200, description = "Snapshot after the fetch", body = ListingSnapshotDto),
        (status = 400, description = "Invalid sort or limit", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn update_filter(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdateFilterRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let session = lookup(&state, id).await?;
    let current = session.listing().snapshot().await.query;
    let update = req.into_update(&current, state.sessions.settings().max_limit)?;
    let snapshot = session.listing().update_filter(&update).await;
    Ok(Json(ListingSnapshotDto::new(session.id(), session.feed(), &snapshot)))
}

/// Session routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session).get(list_sessions))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/reload", post(reload_page))
        .route("/sessions/{id}/next", post(next_page))
        .route("/sessions/{id}/prev", post(prev_page))
        .route("/sessions/{id}/filter", post(update_filter))
}
