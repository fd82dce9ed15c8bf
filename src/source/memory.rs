//! In-memory data source over a fixed project set.
//!
//! Filtering, search, sorting and slicing happen locally with the same
//! semantics the indexer applies remotely. Loaded from a JSON fixture for
//! offline runs.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{ItemRefresher, PageRequest, PageSource, TransactionSource};
use crate::domain::pagination::Page;
use crate::domain::{OrderDirection, Project, TransactionPage, TransactionRecord};
use crate::error::ListingError;

/// Shape of a fixture file.
#[derive(Debug, Default, Deserialize)]
struct Fixture {
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    transactions: HashMap<String, Vec<TransactionRecord>>,
}

/// Project and transaction store answering paged queries locally.
#[derive(Debug, Default)]
pub struct MemorySource {
    projects: RwLock<Vec<Project>>,
    transactions: RwLock<HashMap<String, Vec<TransactionRecord>>>,
}

impl MemorySource {
    /// Creates a source over `projects` with no transactions.
    #[must_use]
    pub fn new(projects: Vec<Project>) -> Self {
        Self {
            projects: RwLock::new(projects),
            transactions: RwLock::new(HashMap::new()),
        }
    }

    /// Loads a JSON fixture `{ "projects": [...], "transactions": {...} }`.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Fetch`] if the file cannot be read and
    /// [`ListingError::Decode`] if it is not a valid fixture.
    pub async fn from_json_file(path: &Path) -> Result<Self, ListingError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ListingError::Fetch(format!("{}: {e}", path.display())))?;
        let fixture: Fixture =
            serde_json::from_slice(&bytes).map_err(|e| ListingError::Decode(e.to_string()))?;
        let transactions = fixture
            .transactions
            .into_iter()
            .map(|(pair, rows)| (pair.to_lowercase(), rows))
            .collect();
        Ok(Self {
            projects: RwLock::new(fixture.projects),
            transactions: RwLock::new(transactions),
        })
    }

    /// Inserts or replaces a project, keyed by address.
    pub async fn upsert(&self, project: Project) {
        let mut projects = self.projects.write().await;
        match projects.iter_mut().find(|p| p.address == project.address) {
            Some(slot) => *slot = project,
            None => projects.push(project),
        }
    }

    /// Replaces the transaction history of `pair`.
    pub async fn set_transactions(&self, pair: &str, rows: Vec<TransactionRecord>) {
        self.transactions.write().await.insert(pair.to_lowercase(), rows);
    }

    /// Number of stored projects.
    pub async fn len(&self) -> usize {
        self.projects.read().await.len()
    }

    /// Returns `true` if no project is stored.
    pub async fn is_empty(&self) -> bool {
        self.projects.read().await.is_empty()
    }
}

#[async_trait]
impl PageSource<Project> for MemorySource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<Project>, ListingError> {
        let projects = self.projects.read().await;
        let mut matching: Vec<&Project> = projects
            .iter()
            .filter(|p| request.status.is_none_or(|s| p.status == s))
            .filter(|p| p.matches(&request.filter))
            .filter(|p| request.search.as_deref().is_none_or(|s| p.matches_search(s)))
            .collect();

        let field = request.order.field.as_str();
        let direction = request.order.direction;
        matching.sort_by(|a, b| compare_missing_last(a.sort_value(field), b.sort_value(field), direction));

        let skip = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(request.page_size).unwrap_or(usize::MAX);
        let items: Vec<Project> = matching.iter().skip(skip).take(take).map(|p| (*p).clone()).collect();
        let has_next_page = matching.len() > skip.saturating_add(items.len());

        Ok(Page {
            items,
            has_next_page,
        })
    }
}

/// Orders present values by `direction`, absent ones last either way.
fn compare_missing_last(a: Option<f64>, b: Option<f64>, direction: OrderDirection) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => match direction {
            OrderDirection::Asc => x.total_cmp(&y),
            OrderDirection::Desc => y.total_cmp(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl ItemRefresher<Project> for MemorySource {
    async fn refresh(&self, item: &Project) -> Result<Project, ListingError> {
        self.projects
            .read()
            .await
            .iter()
            .find(|p| p.address == item.address)
            .cloned()
            .ok_or_else(|| ListingError::Refresh {
                address: item.address.clone(),
                message: "project no longer listed".to_string(),
            })
    }
}

#[async_trait]
impl TransactionSource for MemorySource {
    async fn fetch_transactions(
        &self,
        pair: &str,
        page: u32,
        page_size: u32,
    ) -> Result<TransactionPage, ListingError> {
        let page = page.max(1);
        let transactions = self.transactions.read().await;
        let rows = transactions
            .get(&pair.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default();
        let skip = usize::try_from(u64::from(page - 1) * u64::from(page_size)).unwrap_or(usize::MAX);
        let take = usize::try_from(page_size).unwrap_or(usize::MAX);
        let items: Vec<TransactionRecord> = rows.iter().skip(skip).take(take).cloned().collect();
        let has_next_page = rows.len() > skip.saturating_add(items.len());
        Ok(TransactionPage {
            page,
            items,
            has_next_page,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::project::tests::project;
    use crate::domain::{FilterKey, FilterState, LaunchStatus, SortOrder, TransactionKind};
    use chrono::Utc;

    fn request(status: Option<LaunchStatus>, page: u32, page_size: u32) -> PageRequest {
        let Some(order) = SortOrder::new("tvl", OrderDirection::Desc) else {
            panic!("valid order");
        };
        PageRequest {
            status,
            filter: FilterState::new(),
            search: None,
            page,
            page_size,
            order,
        }
    }

    fn seeded() -> MemorySource {
        let mut projects = Vec::new();
        for i in 0..5_u32 {
            projects.push(
                project(&format!("0x{i:02}"), LaunchStatus::Success)
                    .with_metric(FilterKey::Tvl, f64::from(i)),
            );
        }
        projects.push(project("0xpot", LaunchStatus::Processing));
        MemorySource::new(projects)
    }

    #[tokio::test]
    async fn pages_are_sorted_and_sliced() {
        let source = seeded();
        let Ok(first) = source.fetch_page(&request(Some(LaunchStatus::Success), 0, 2)).await else {
            panic!("fetch failed");
        };
        let keys: Vec<&str> = first.items.iter().map(|p| p.address.as_str()).collect();
        assert_eq!(keys, vec!["0x04", "0x03"]);
        assert!(first.has_next_page);

        let Ok(last) = source.fetch_page(&request(Some(LaunchStatus::Success), 2, 2)).await else {
            panic!("fetch failed");
        };
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_next_page);
    }

    #[tokio::test]
    async fn missing_sort_values_go_last() {
        let source = seeded();
        let Ok(page) = source.fetch_page(&request(None, 0, 10)).await else {
            panic!("fetch failed");
        };
        assert_eq!(page.items.last().map(|p| p.address.as_str()), Some("0xpot"));
    }

    #[tokio::test]
    async fn refresh_returns_stored_version() {
        let source = seeded();
        let stale = project("0x01", LaunchStatus::Success);
        source
            .upsert(stale.clone().with_metric(FilterKey::DepositedRaisedToken, 42.0))
            .await;
        let Ok(fresh) = source.refresh(&stale).await else {
            panic!("refresh failed");
        };
        assert_eq!(fresh.metric(FilterKey::DepositedRaisedToken), Some(42.0));

        let gone = project("0xgone", LaunchStatus::Success);
        assert!(source.refresh(&gone).await.is_err());
    }

    #[tokio::test]
    async fn transactions_page_is_one_based() {
        let source = MemorySource::default();
        let rows = (0..3)
            .map(|i| TransactionRecord {
                id: format!("0xtx{i}"),
                kind: TransactionKind::Deposit,
                account: "0xacc".to_string(),
                timestamp: Utc::now(),
                amount: Some("1".to_string()),
            })
            .collect();
        source.set_transactions("0xPAIR", rows).await;

        let Ok(page) = source.fetch_transactions("0xpair", 1, 2).await else {
            panic!("fetch failed");
        };
        assert_eq!(page.items.len(), 2);
        assert!(page.has_next_page);
        assert_eq!(page.items.first().map(|t| t.id.as_str()), Some("0xtx0"));
    }
}
