//! Domain layer: listing model, pagination state machine, and event system.
//!
//! Everything here is synchronous and free of I/O. The pagination state
//! machine produces fetch tickets; the service layer executes them against
//! a data source and feeds the results back.

pub mod async_state;
pub mod event_bus;
pub mod feed;
pub mod filter;
pub mod listing_event;
pub mod pagination;
pub mod price_change;
pub mod project;
pub mod session_id;
pub mod transaction;

pub use async_state::{AsyncState, RequestEpoch};
pub use event_bus::EventBus;
pub use feed::Feed;
pub use filter::{
    Criterion, CriterionKind, FilterKey, FilterPatch, FilterState, OrderDirection, Range, RawFilter,
    SortOrder, has_value, normalize,
};
pub use listing_event::ListingEvent;
pub use pagination::{
    FetchTicket, ItemsGeneration, ListingQuery, ListingSnapshot, ListingUpdate, LoadPhase, Page,
    PageMode, PaginationState,
};
pub use price_change::{HourlyPrice, PriceChange, price_change_24h};
pub use project::{LaunchStatus, ListingItem, Project};
pub use session_id::SessionId;
pub use transaction::{TransactionKind, TransactionPage, TransactionRecord, format_units};
