//! Transaction history handler.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{TransactionHistoryResponse, TransactionParams};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /projects/{address}/transactions` — Paged transaction history.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for an empty address. Fetch
/// failures are reported in the response body instead.
#[utoipa::path(
    get,
    path = "/api/v1/projects/{address}/transactions",
    tag = "Projects",
    summary = "Transaction history",
    description = "Returns one page of a launch's swaps, deposits, refunds and LP claims, newest first. Indexer failures are reported in `error` with the last good page kept.",
    params(("address" = String, Path, description = "Pair contract address"), TransactionParams),
    responses(
        (status = 200, description = "Transaction page", body = TransactionHistoryResponse),
        (status = 400, description = "Invalid address", body = ErrorResponse),
    )
)]
pub async fn project_transactions(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(params): Query<TransactionParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "address must not be empty".to_string(),
        ));
    }
    let params = params.clamped();
    let result = state
        .transactions
        .fetch(address, params.page, params.per_page)
        .await;
    Ok(Json(TransactionHistoryResponse::new(
        address,
        &result,
        params.raise_decimals,
    )))
}

/// Project routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/projects/{address}/transactions", get(project_transactions))
}
