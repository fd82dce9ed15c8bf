//! # launchpad-gateway
//!
//! REST API and WebSocket gateway serving paginated, filterable and
//! auto-refreshing project listings of a token launchpad.
//!
//! A client opens a listing session bound to a feed (pumping, potting or
//! trending), navigates it page by page and narrows it with filters.
//! Pages come from a GraphQL indexer; responses that arrive after a newer
//! request was issued are discarded. Feeds that track live deposits
//! re-fetch their visible items on a fixed interval.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── SessionService, TransactionService (service/)
//!     ├── ListingService + RefreshDriver (service/)
//!     ├── EventBus, PaginationState, AsyncState (domain/)
//!     │
//!     └── PageSource: IndexerClient | MemorySource (source/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod source;
pub mod ws;

#[cfg(test)]
pub(crate) mod testing;
