//! GraphQL indexer client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::queries;
use super::wire::{GraphResponse, Pot2PumpList, Pot2PumpSingle, TransactionList, WireTransaction};
use super::{ItemRefresher, PageRequest, PageSource, TransactionSource};
use crate::domain::pagination::Page;
use crate::domain::{Project, TransactionPage, TransactionRecord};
use crate::error::ListingError;

#[derive(Debug, Serialize)]
struct GraphRequest<'a> {
    query: &'a str,
    variables: Value,
}

/// Reads launches and their transactions from a subgraph endpoint.
#[derive(Debug, Clone)]
pub struct IndexerClient {
    http: Client,
    endpoint: String,
}

impl IndexerClient {
    /// Creates a client posting to `endpoint` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Fetch`] if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ListingError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// Endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn query<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T, ListingError> {
        let response: GraphResponse<T> = self
            .http
            .post(&self.endpoint)
            .json(&GraphRequest { query, variables })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        response.into_data()
    }
}

#[async_trait]
impl PageSource<Project> for IndexerClient {
    #[instrument(skip(self), fields(page = request.page, size = request.page_size))]
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<Project>, ListingError> {
        let list: Pot2PumpList = self
            .query(&queries::list_pot2pumps(), queries::list_variables(request))
            .await?;
        let now = Utc::now();
        let mut items = list
            .pot2_pumps
            .into_iter()
            .map(|row| row.into_project(now))
            .collect::<Result<Vec<_>, _>>()?;

        let limit = usize::try_from(request.page_size).unwrap_or(usize::MAX);
        let has_next_page = items.len() > limit;
        items.truncate(limit);
        debug!(count = items.len(), has_next_page, "indexer page fetched");
        Ok(Page {
            items,
            has_next_page,
        })
    }
}

#[async_trait]
impl ItemRefresher<Project> for IndexerClient {
    async fn refresh(&self, item: &Project) -> Result<Project, ListingError> {
        let refresh_error = |message: String| ListingError::Refresh {
            address: item.address.clone(),
            message,
        };
        let single: Pot2PumpSingle = self
            .query(&queries::pot2pump_by_id(), json!({ "id": item.address }))
            .await
            .map_err(|e| refresh_error(e.to_string()))?;
        single
            .pot2_pump
            .ok_or_else(|| refresh_error("pair not found".to_string()))?
            .into_project(Utc::now())
            .map_err(|e| refresh_error(e.to_string()))
    }
}

#[async_trait]
impl TransactionSource for IndexerClient {
    #[instrument(skip(self))]
    async fn fetch_transactions(
        &self,
        pair: &str,
        page: u32,
        page_size: u32,
    ) -> Result<TransactionPage, ListingError> {
        let page = page.max(1);
        let variables = json!({
            "first": u64::from(page_size) + 1,
            "skip": u64::from(page - 1) * u64::from(page_size),
            "pair": pair.to_lowercase(),
        });
        let list: TransactionList = self.query(queries::POT2PUMP_TRANSACTIONS, variables).await?;
        let mut items: Vec<TransactionRecord> = list
            .transactions
            .into_iter()
            .filter_map(WireTransaction::into_record)
            .collect();

        let limit = usize::try_from(page_size).unwrap_or(usize::MAX);
        let has_next_page = items.len() > limit;
        items.truncate(limit);
        Ok(TransactionPage {
            page,
            items,
            has_next_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_endpoint() {
        let client = IndexerClient::new("http://localhost:8000/subgraphs/launch", Duration::from_secs(5));
        assert!(client.is_ok_and(|c| c.endpoint().ends_with("/launch")));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_fetch_error() {
        let Ok(client) = IndexerClient::new("http://127.0.0.1:9/graphql", Duration::from_millis(500))
        else {
            return;
        };
        let result = client.fetch_transactions("0xpair", 1, 10).await;
        assert!(matches!(result, Err(ListingError::Fetch(_))));
    }
}
