//! Shared DTO types used across multiple endpoints.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::Project;

/// A launch as listed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProjectDto {
    /// Pair contract address.
    pub address: String,
    /// Launch token name.
    pub name: String,
    /// Launch token symbol.
    pub symbol: String,
    /// `processing`, `success` or `fail`.
    pub status: String,
    /// Raise token symbol.
    pub raise_token_symbol: String,
    /// Raise token address.
    pub raise_token_address: String,
    /// Raise token decimals.
    pub raise_token_decimals: u8,
    /// Creator address.
    pub creator: String,
    /// Numeric metrics keyed by filter key.
    pub metrics: BTreeMap<String, f64>,
    /// End of the raising window.
    pub end_time: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Project> for ProjectDto {
    fn from(project: &Project) -> Self {
        Self {
            address: project.address.clone(),
            name: project.name.clone(),
            symbol: project.symbol.clone(),
            status: project.status.to_string(),
            raise_token_symbol: project.raise_token_symbol.clone(),
            raise_token_address: project.raise_token_address.clone(),
            raise_token_decimals: project.raise_token_decimals,
            creator: project.creator.clone(),
            metrics: project
                .metrics
                .iter()
                .map(|(key, value)| (key.as_str().to_string(), *value))
                .collect(),
            end_time: project.end_time,
            created_at: project.created_at,
        }
    }
}
