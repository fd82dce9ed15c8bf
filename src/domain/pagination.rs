//! Pagination state machine for listing pages.
//!
//! [`PaginationState`] is immutable from the outside: every operation is a
//! transition `&self -> Self` that returns the next state, plus a
//! [`FetchTicket`] describing the request the caller must issue. The
//! ticket is later handed back to [`PaginationState::settle`] together
//! with the fetch outcome.
//!
//! ```text
//! Idle ──begin_*──▶ Loading ──settle(Ok)──▶ Loaded
//!                      │                      │
//!                      └──settle(Err)──▶ Errored
//! Loaded / Errored ──begin_*──▶ Loading
//! ```
//!
//! Each ticket carries a [`RequestEpoch`]. Settling a ticket that is not
//! the latest issued one is a no-op, which removes the request race
//! between overlapping reloads and filter updates.

use serde::Serialize;

use super::async_state::{AsyncState, RequestEpoch};
use super::filter::{FilterPatch, FilterState, SortOrder};
use super::project::ListingItem;
use crate::error::ListingError;

/// One slice returned by a data source.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items of the slice, in source order.
    pub items: Vec<T>,
    /// Source's claim that more items follow.
    pub has_next_page: bool,
}

/// How a fetched slice is combined with the loaded items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageMode {
    /// Append to the loaded items (infinite scroll).
    #[default]
    Append,
    /// Replace the loaded items (numbered pagination).
    Replace,
}

/// Coarse phase of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    /// Nothing fetched yet.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The latest fetch succeeded.
    Loaded,
    /// The latest fetch failed; items are the last good ones.
    Errored,
}

/// Query parameters shared by every page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingQuery {
    /// Active criteria.
    pub filter: FilterState,
    /// Free-text search, never empty when present.
    pub search: Option<String>,
    /// Sort order.
    pub order: SortOrder,
    /// Page size, always positive.
    pub limit: u32,
}

impl ListingQuery {
    /// Creates a query without filter or search. A zero `limit` becomes 1.
    #[must_use]
    pub fn new(order: SortOrder, limit: u32) -> Self {
        Self {
            filter: FilterState::new(),
            search: None,
            order,
            limit: limit.max(1),
        }
    }
}

/// Partial update of a [`ListingQuery`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingUpdate {
    /// Criteria to set or clear.
    pub filter: FilterPatch,
    /// New search text; an empty string clears the search.
    pub search: Option<String>,
    /// New sort order.
    pub order: Option<SortOrder>,
    /// New page size; zero is ignored.
    pub limit: Option<u32>,
}

/// Request a caller must issue after a `begin_*` transition.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    epoch: RequestEpoch,
    page: u32,
    mode: PageMode,
    query: ListingQuery,
}

impl FetchTicket {
    /// Epoch guarding this request.
    #[must_use]
    pub const fn epoch(&self) -> RequestEpoch {
        self.epoch
    }

    /// Zero-based page to fetch.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// How the result is combined with loaded items.
    #[must_use]
    pub const fn mode(&self) -> PageMode {
        self.mode
    }

    /// Query to fetch with.
    #[must_use]
    pub const fn query(&self) -> &ListingQuery {
        &self.query
    }
}

/// Identifies the loaded item list a refresh was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemsGeneration(u64);

/// Serializable view of a [`PaginationState`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingSnapshot<T> {
    /// Loaded items.
    pub items: Vec<T>,
    /// Zero-based index of the last loaded page.
    pub current_page: u32,
    /// Whether another page can be requested.
    pub has_next_page: bool,
    /// `true` while a fetch is in flight.
    pub loading: bool,
    /// Message of the last failed fetch.
    pub error: Option<String>,
    /// Coarse phase.
    pub phase: LoadPhase,
    /// Active query.
    pub query: ListingQuery,
}

/// Items, page cursor and query of one listing.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationState<T> {
    items: Vec<T>,
    current_page: u32,
    has_next_page: bool,
    query: ListingQuery,
    phase: LoadPhase,
    request: AsyncState<u32>,
    generation: u64,
}

impl<T: ListingItem> PaginationState<T> {
    /// Creates an idle state with no items.
    #[must_use]
    pub fn new(query: ListingQuery) -> Self {
        Self {
            items: Vec::new(),
            current_page: 0,
            has_next_page: false,
            query,
            phase: LoadPhase::Idle,
            request: AsyncState::new(),
            generation: 0,
        }
    }

    /// Loaded items.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Zero-based index of the last loaded page.
    #[must_use]
    pub const fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Whether another page can be requested. Only trustworthy right
    /// after a successful fetch; filter changes reset it to `false`.
    #[must_use]
    pub const fn has_next_page(&self) -> bool {
        self.has_next_page
    }

    /// Active query.
    #[must_use]
    pub const fn query(&self) -> &ListingQuery {
        &self.query
    }

    /// Coarse phase.
    #[must_use]
    pub const fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// `true` while a fetch is in flight.
    #[must_use]
    pub const fn loading(&self) -> bool {
        self.request.loading
    }

    /// Message of the last failed fetch.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.request.error.as_deref()
    }

    /// Generation of the loaded item list.
    #[must_use]
    pub const fn generation(&self) -> ItemsGeneration {
        ItemsGeneration(self.generation)
    }

    /// Clones the observable parts of the state.
    #[must_use]
    pub fn snapshot(&self) -> ListingSnapshot<T> {
        ListingSnapshot {
            items: self.items.clone(),
            current_page: self.current_page,
            has_next_page: self.has_next_page,
            loading: self.request.loading,
            error: self.request.error.clone(),
            phase: self.phase,
            query: self.query.clone(),
        }
    }

    /// Restarts from page 0 with the current query.
    #[must_use]
    pub fn begin_reload(&self) -> (Self, FetchTicket) {
        let mut next = self.clone();
        next.current_page = 0;
        next.has_next_page = false;
        next.issue(0, PageMode::Replace)
    }

    /// Requests the page after the current one.
    ///
    /// Returns `None` (nothing to fetch) if there is no next page or a
    /// fetch is already in flight.
    #[must_use]
    pub fn begin_next(&self, mode: PageMode) -> Option<(Self, FetchTicket)> {
        if !self.has_next_page || self.request.loading {
            return None;
        }
        let page = self.current_page.checked_add(1)?;
        Some(self.clone().issue(page, mode))
    }

    /// Requests the page before the current one, replacing the items.
    ///
    /// Returns `None` on the first page or while a fetch is in flight.
    #[must_use]
    pub fn begin_prev(&self) -> Option<(Self, FetchTicket)> {
        if self.current_page == 0 || self.request.loading {
            return None;
        }
        let page = self.current_page - 1;
        Some(self.clone().issue(page, PageMode::Replace))
    }

    /// Applies a query update and restarts from page 0.
    #[must_use]
    pub fn begin_update(&self, update: &ListingUpdate) -> (Self, FetchTicket) {
        let mut next = self.clone();
        next.query.filter = next.query.filter.merge(&update.filter);
        if let Some(search) = &update.search {
            let trimmed = search.trim();
            next.query.search = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        if let Some(order) = &update.order {
            next.query.order = order.clone();
        }
        if let Some(limit) = update.limit.filter(|l| *l > 0) {
            next.query.limit = limit;
        }
        next.begin_reload()
    }

    /// Settles `ticket` with the fetch outcome.
    ///
    /// Returns `None` if the ticket is stale (a newer request was issued
    /// since); the caller must then keep the current state.
    #[must_use]
    pub fn settle(
        &self,
        ticket: &FetchTicket,
        outcome: Result<Page<T>, ListingError>,
    ) -> Option<Self> {
        if !self.request.is_current(ticket.epoch) {
            return None;
        }
        let mut next = self.clone();
        match outcome {
            Ok(page) => {
                let limit = usize::try_from(ticket.query.limit).unwrap_or(usize::MAX);
                next.has_next_page = page.has_next_page && page.items.len() >= limit;
                match ticket.mode {
                    PageMode::Replace => {
                        next.items = page.items;
                        next.generation = next.generation.saturating_add(1);
                    }
                    PageMode::Append => next.items.extend(page.items),
                }
                next.current_page = ticket.page;
                next.phase = LoadPhase::Loaded;
                next.request.succeed(ticket.epoch, ticket.page);
            }
            Err(err) => {
                next.phase = LoadPhase::Errored;
                next.request.fail(ticket.epoch, err);
            }
        }
        Some(next)
    }

    /// Replaces the item at `index` with its refreshed version.
    ///
    /// Returns `None` if the item list changed since `generation` or the
    /// item at `index` has a different key. Order, length, page cursor
    /// and `has_next_page` never change.
    #[must_use]
    pub fn apply_refresh(&self, generation: ItemsGeneration, index: usize, item: T) -> Option<Self> {
        if generation.0 != self.generation {
            return None;
        }
        if self.items.get(index)?.key() != item.key() {
            return None;
        }
        let mut next = self.clone();
        let slot = next.items.get_mut(index)?;
        *slot = item;
        Some(next)
    }

    fn issue(mut self, page: u32, mode: PageMode) -> (Self, FetchTicket) {
        let epoch = self.request.start();
        self.phase = LoadPhase::Loading;
        let ticket = FetchTicket {
            epoch,
            page,
            mode,
            query: self.query.clone(),
        };
        (self, ticket)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::filter::{FilterKey, OrderDirection, RawFilter};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        key: String,
        value: u32,
    }

    impl ListingItem for Row {
        fn key(&self) -> &str {
            &self.key
        }
    }

    fn rows(range: std::ops::Range<u32>) -> Vec<Row> {
        range
            .map(|i| Row {
                key: format!("0x{i:02x}"),
                value: i,
            })
            .collect()
    }

    fn state(limit: u32) -> PaginationState<Row> {
        let Some(order) = SortOrder::new("endTime", OrderDirection::Desc) else {
            panic!("valid order");
        };
        PaginationState::new(ListingQuery::new(order, limit))
    }

    fn loaded(limit: u32, items: Vec<Row>, has_next_page: bool) -> PaginationState<Row> {
        let (s, ticket) = state(limit).begin_reload();
        let Some(s) = s.settle(&ticket, Ok(Page { items, has_next_page })) else {
            panic!("fresh ticket must settle");
        };
        s
    }

    fn patch(value: serde_json::Value) -> FilterPatch {
        let serde_json::Value::Object(map) = value else {
            panic!("object");
        };
        let raw: RawFilter = map;
        FilterPatch::from_raw(&raw)
    }

    #[test]
    fn new_state_is_idle() {
        let s = state(10);
        assert_eq!(s.phase(), LoadPhase::Idle);
        assert!(s.items().is_empty());
        assert!(!s.loading());
    }

    #[test]
    fn reload_replaces_items_and_sets_flags() {
        let s = loaded(10, rows(0..10), true);
        assert_eq!(s.items().len(), 10);
        assert!(s.has_next_page());
        assert_eq!(s.phase(), LoadPhase::Loaded);
        assert_eq!(s.current_page(), 0);
    }

    #[test]
    fn begin_reload_enters_loading() {
        let (s, ticket) = state(10).begin_reload();
        assert!(s.loading());
        assert_eq!(s.phase(), LoadPhase::Loading);
        assert_eq!(ticket.page(), 0);
        assert_eq!(ticket.mode(), PageMode::Replace);
    }

    #[test]
    fn append_scenario_seventeen_items() {
        let s = loaded(10, rows(0..10), true);
        let Some((s, ticket)) = s.begin_next(PageMode::Append) else {
            panic!("next page should be available");
        };
        assert_eq!(ticket.page(), 1);
        let Some(s) = s.settle(&ticket, Ok(Page { items: rows(10..17), has_next_page: true })) else {
            panic!("ticket is current");
        };
        assert_eq!(s.items().len(), 17);
        assert!(!s.has_next_page());
        assert_eq!(s.current_page(), 1);
    }

    #[test]
    fn replace_mode_swaps_items() {
        let s = loaded(10, rows(0..10), true);
        let Some((s, ticket)) = s.begin_next(PageMode::Replace) else {
            panic!("next page should be available");
        };
        let Some(s) = s.settle(&ticket, Ok(Page { items: rows(10..20), has_next_page: true })) else {
            panic!("ticket is current");
        };
        assert_eq!(s.items().len(), 10);
        assert_eq!(s.items().first().map(|r| r.value), Some(10));
        assert!(s.has_next_page());
    }

    #[test]
    fn short_page_overrides_server_claim() {
        let s = loaded(10, rows(0..4), true);
        assert!(!s.has_next_page());
    }

    #[test]
    fn next_without_next_page_is_noop() {
        let s = loaded(10, rows(0..3), false);
        assert!(s.begin_next(PageMode::Append).is_none());
    }

    #[test]
    fn next_while_loading_is_noop() {
        let s = loaded(10, rows(0..10), true);
        let Some((s, _ticket)) = s.begin_next(PageMode::Append) else {
            panic!("next page should be available");
        };
        assert!(s.begin_next(PageMode::Append).is_none());
    }

    #[test]
    fn failed_fetch_keeps_items() {
        let s = loaded(10, rows(0..10), true);
        let before = s.items().to_vec();
        let (s, ticket) = s.begin_reload();
        let Some(s) = s.settle(&ticket, Err(ListingError::Fetch("down".to_string()))) else {
            panic!("ticket is current");
        };
        assert_eq!(s.items(), before.as_slice());
        assert_eq!(s.phase(), LoadPhase::Errored);
        assert_eq!(s.error(), Some("fetch failed: down"));
        assert!(!s.loading());
    }

    #[test]
    fn failed_next_keeps_page_cursor() {
        let s = loaded(10, rows(0..10), true);
        let Some((s, ticket)) = s.begin_next(PageMode::Append) else {
            panic!("next page should be available");
        };
        let Some(s) = s.settle(&ticket, Err(ListingError::Fetch("x".to_string()))) else {
            panic!("ticket is current");
        };
        assert_eq!(s.current_page(), 0);
        assert!(s.has_next_page());
        assert_eq!(s.items().len(), 10);
    }

    #[test]
    fn update_resets_page_for_any_patch() {
        let patches = [
            json!({}),
            json!({ "tvl": { "min": 1 } }),
            json!({ "tvl": null }),
            json!({ "bogus": 1 }),
        ];
        for p in patches {
            let s = loaded(10, rows(0..10), true);
            let Some((s, ticket)) = s.begin_next(PageMode::Replace) else {
                panic!("next page should be available");
            };
            let Some(s) = s.settle(&ticket, Ok(Page { items: rows(10..20), has_next_page: true })) else {
                panic!("ticket is current");
            };
            assert_eq!(s.current_page(), 1);

            let update = ListingUpdate {
                filter: patch(p),
                ..ListingUpdate::default()
            };
            let (s, ticket) = s.begin_update(&update);
            assert_eq!(s.current_page(), 0);
            assert!(!s.has_next_page());
            assert_eq!(ticket.page(), 0);

            let Some(s) = s.settle(&ticket, Err(ListingError::Fetch("x".to_string()))) else {
                panic!("ticket is current");
            };
            assert_eq!(s.current_page(), 0);
        }
    }

    #[test]
    fn update_merges_search_order_and_limit() {
        let s = loaded(10, rows(0..10), true);
        let update = ListingUpdate {
            filter: patch(json!({ "marketcap": { "max": 9 } })),
            search: Some("  pepe ".to_string()),
            order: SortOrder::new("tvl", OrderDirection::Asc),
            limit: Some(0),
        };
        let (s, ticket) = s.begin_update(&update);
        assert_eq!(ticket.query().search.as_deref(), Some("pepe"));
        assert_eq!(ticket.query().order.field, "tvl");
        assert_eq!(ticket.query().limit, 10);
        assert!(ticket.query().filter.get(FilterKey::Marketcap).is_some());

        let clear = ListingUpdate {
            search: Some(String::new()),
            ..ListingUpdate::default()
        };
        let (_, ticket) = s.begin_update(&clear);
        assert!(ticket.query().search.is_none());
        assert!(ticket.query().filter.get(FilterKey::Marketcap).is_some());
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let s = loaded(10, rows(0..10), true);
        let (s, first) = s.begin_update(&ListingUpdate {
            filter: patch(json!({ "tvl": { "min": 1 } })),
            ..ListingUpdate::default()
        });
        let (s, second) = s.begin_update(&ListingUpdate {
            filter: patch(json!({ "tvl": { "min": 2 } })),
            ..ListingUpdate::default()
        });

        let Some(s) = s.settle(&second, Ok(Page { items: rows(50..52), has_next_page: false })) else {
            panic!("second ticket is current");
        };
        assert!(s.settle(&first, Ok(Page { items: rows(0..10), has_next_page: true })).is_none());
        assert_eq!(s.items().first().map(|r| r.value), Some(50));
    }

    #[test]
    fn prev_goes_back_and_stops_at_zero() {
        let s = loaded(10, rows(0..10), true);
        assert!(s.begin_prev().is_none());

        let Some((s, ticket)) = s.begin_next(PageMode::Replace) else {
            panic!("next page should be available");
        };
        let Some(s) = s.settle(&ticket, Ok(Page { items: rows(10..20), has_next_page: true })) else {
            panic!("ticket is current");
        };
        let Some((s, ticket)) = s.begin_prev() else {
            panic!("previous page should be available");
        };
        assert_eq!(ticket.page(), 0);
        assert_eq!(ticket.mode(), PageMode::Replace);
        let Some(s) = s.settle(&ticket, Ok(Page { items: rows(0..10), has_next_page: true })) else {
            panic!("ticket is current");
        };
        assert_eq!(s.current_page(), 0);
    }

    #[test]
    fn refresh_replaces_in_place() {
        let s = loaded(10, rows(0..3), false);
        let generation = s.generation();
        let refreshed = Row {
            key: "0x01".to_string(),
            value: 99,
        };
        let Some(next) = s.apply_refresh(generation, 1, refreshed) else {
            panic!("refresh should apply");
        };
        assert_eq!(next.items().len(), 3);
        assert_eq!(next.items().get(1).map(|r| r.value), Some(99));
        assert_eq!(next.current_page(), s.current_page());
        assert_eq!(next.has_next_page(), s.has_next_page());
    }

    #[test]
    fn refresh_rejects_mismatch_or_old_generation() {
        let s = loaded(10, rows(0..3), false);
        let generation = s.generation();
        let wrong_key = Row {
            key: "0xff".to_string(),
            value: 1,
        };
        assert!(s.apply_refresh(generation, 0, wrong_key).is_none());

        let (s2, ticket) = s.begin_reload();
        let Some(s2) = s2.settle(&ticket, Ok(Page { items: rows(0..3), has_next_page: false })) else {
            panic!("ticket is current");
        };
        let row = Row {
            key: "0x00".to_string(),
            value: 5,
        };
        assert!(s2.apply_refresh(generation, 0, row).is_none());
    }
}
