//! Listing session DTOs: create, snapshot, navigation and filter updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::ProjectDto;
use crate::domain::{
    Feed, FilterPatch, ListingQuery, ListingSnapshot, ListingUpdate, LoadPhase, OrderDirection,
    PageMode, Project, RawFilter, SessionId, SortOrder,
};
use crate::error::GatewayError;
use crate::service::SessionSummary;

/// Request body for `POST /sessions`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    /// Feed to list: `pumping`, `potting` or `trending`.
    pub feed: String,
    /// Page size; defaults to the server setting.
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Response body for `POST /sessions` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateSessionResponse {
    /// Session identifier.
    pub session_id: uuid::Uuid,
    /// Feed echoed from the request.
    pub feed: String,
    /// Effective page size.
    pub limit: u32,
    /// Whether loaded items are refreshed periodically.
    pub refreshing: bool,
    /// Server creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query of `GET /sessions`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListSessionsParams {
    /// Restrict to one feed.
    #[serde(default)]
    pub feed: Option<String>,
}

/// Session summary for list responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSummaryDto {
    /// Session identifier.
    pub session_id: uuid::Uuid,
    /// Feed name.
    pub feed: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Loaded item count.
    pub item_count: usize,
    /// Zero-based current page.
    pub current_page: u32,
    /// Whether a fetch is in flight.
    pub loading: bool,
    /// Whether the refresh loop runs.
    pub refreshing: bool,
}

impl From<SessionSummary> for SessionSummaryDto {
    fn from(summary: SessionSummary) -> Self {
        Self {
            session_id: *summary.session_id.as_uuid(),
            feed: summary.feed.to_string(),
            created_at: summary.created_at,
            item_count: summary.item_count,
            current_page: summary.current_page,
            loading: summary.loading,
            refreshing: summary.refreshing,
        }
    }
}

/// Response body for `GET /sessions`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionListResponse {
    /// Sessions, oldest first.
    pub data: Vec<SessionSummaryDto>,
    /// Number of sessions.
    pub total: usize,
}

/// Active query of a listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListingQueryDto {
    /// Active criteria keyed by filter key.
    #[schema(value_type = Object)]
    pub filter: serde_json::Value,
    /// Free-text search.
    pub search: Option<String>,
    /// Sort field.
    pub order_by: String,
    /// `asc` or `desc`.
    pub order_direction: String,
    /// Page size.
    pub limit: u32,
}

impl From<&ListingQuery> for ListingQueryDto {
    fn from(query: &ListingQuery) -> Self {
        Self {
            filter: serde_json::to_value(&query.filter).unwrap_or_default(),
            search: query.search.clone(),
            order_by: query.order.field.clone(),
            order_direction: query.order.direction.as_str().to_string(),
            limit: query.limit,
        }
    }
}

/// Observable state of a listing session.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListingSnapshotDto {
    /// Session identifier.
    pub session_id: uuid::Uuid,
    /// Feed name.
    pub feed: String,
    /// Loaded items.
    pub items: Vec<ProjectDto>,
    /// Zero-based index of the last loaded page.
    pub current_page: u32,
    /// Whether another page can be requested.
    pub has_next_page: bool,
    /// Whether a fetch is in flight.
    pub loading: bool,
    /// Message of the last failed fetch.
    pub error: Option<String>,
    /// `idle`, `loading`, `loaded` or `errored`.
    pub phase: String,
    /// Active query.
    pub query: ListingQueryDto,
}

impl ListingSnapshotDto {
    /// Builds the DTO for `session_id` on `feed`.
    #[must_use]
    pub fn new(session_id: SessionId, feed: Feed, snapshot: &ListingSnapshot<Project>) -> Self {
        let phase = match snapshot.phase {
            LoadPhase::Idle => "idle",
            LoadPhase::Loading => "loading",
            LoadPhase::Loaded => "loaded",
            LoadPhase::Errored => "errored",
        };
        Self {
            session_id: *session_id.as_uuid(),
            feed: feed.to_string(),
            items: snapshot.items.iter().map(ProjectDto::from).collect(),
            current_page: snapshot.current_page,
            has_next_page: snapshot.has_next_page,
            loading: snapshot.loading,
            error: snapshot.error.clone(),
            phase: phase.to_string(),
            query: ListingQueryDto::from(&snapshot.query),
        }
    }
}

/// Query of `POST /sessions/{id}/next`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NextPageParams {
    /// `append` (default) or `replace`.
    #[serde(default)]
    pub mode: Option<String>,
}

impl NextPageParams {
    /// Parses the requested mode.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for an unknown mode.
    pub fn page_mode(&self) -> Result<PageMode, GatewayError> {
        match self.mode.as_deref().map(str::trim) {
            None | Some("" | "append") => Ok(PageMode::Append),
            Some("replace") => Ok(PageMode::Replace),
            Some(other) => Err(GatewayError::InvalidRequest(format!(
                "unknown page mode '{other}', expected append or replace"
            ))),
        }
    }
}

/// Request body for `POST /sessions/{id}/filter`.
///
/// Every field is optional; omitted fields keep their current value.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateFilterRequest {
    /// Criteria to merge: `{ "tvl": { "min": 1000 } }` sets a range,
    /// `null`, `""`, `{}` clear a key. Unknown keys and malformed values
    /// are ignored.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub filter: Option<RawFilter>,
    /// Search text; empty clears it.
    #[serde(default)]
    pub search: Option<String>,
    /// Sort field.
    #[serde(default)]
    pub order_by: Option<String>,
    /// `asc` or `desc`; defaults to `desc` when `order_by` is given.
    #[serde(default)]
    pub order_direction: Option<String>,
    /// New page size.
    #[serde(default)]
    pub limit: Option<u32>,
}

impl UpdateFilterRequest {
    /// Converts to a [`ListingUpdate`]; `current` supplies the sort field
    /// when only the direction changes.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for an invalid sort field,
    /// direction, or a page size outside `1..=max_limit`.
    pub fn into_update(
        self,
        current: &ListingQuery,
        max_limit: u32,
    ) -> Result<ListingUpdate, GatewayError> {
        let direction = match self.order_direction.as_deref().map(str::trim) {
            None | Some("") => None,
            Some("asc") => Some(OrderDirection::Asc),
            Some("desc") => Some(OrderDirection::Desc),
            Some(other) => {
                return Err(GatewayError::InvalidRequest(format!(
                    "unknown order direction '{other}'"
                )));
            }
        };
        let order = match (self.order_by.as_deref().map(str::trim), direction) {
            (Some(field), direction) if !field.is_empty() => Some(
                SortOrder::new(field, direction.unwrap_or_default()).ok_or_else(|| {
                    GatewayError::InvalidRequest(format!("invalid sort field '{field}'"))
                })?,
            ),
            (_, Some(direction)) => Some(SortOrder {
                field: current.order.field.clone(),
                direction,
            }),
            _ => None,
        };
        if let Some(limit) = self.limit
            && (limit == 0 || limit > max_limit)
        {
            return Err(GatewayError::InvalidRequest(format!(
                "limit must be between 1 and {max_limit}"
            )));
        }
        Ok(ListingUpdate {
            filter: self
                .filter
                .as_ref()
                .map(FilterPatch::from_raw)
                .unwrap_or_default(),
            search: self.search,
            order,
            limit: self.limit,
        })
    }
}
