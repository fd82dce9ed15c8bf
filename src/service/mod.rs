//! Service layer: listing orchestration.
//!
//! [`ListingService`] drives one pagination state machine against a data
//! source, [`RefreshDriver`] keeps its items fresh, and [`SessionService`]
//! owns the lifecycle of every listing session. All of them emit events
//! through the [`super::domain::EventBus`].

pub mod async_request;
pub mod listing_service;
pub mod refresh_driver;
pub mod session_registry;
pub mod session_service;
pub mod transaction_service;

pub use async_request::AsyncRequest;
pub use listing_service::ListingService;
pub use refresh_driver::{RefreshDriver, RefreshHandle};
pub use session_registry::{ListingSession, SessionRegistry, SessionSummary};
pub use session_service::{SessionService, SessionSettings};
pub use transaction_service::TransactionService;
