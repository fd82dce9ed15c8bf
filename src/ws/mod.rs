//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The endpoint at `/ws` streams [`crate::domain::ListingEvent`]s of the
//! sessions a client subscribed to and answers snapshot requests.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
