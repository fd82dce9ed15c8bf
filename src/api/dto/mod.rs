//! Data Transfer Objects for REST request/response serialization.
//!
//! DTOs flatten domain types into plain strings and numbers so the
//! OpenAPI schema stays independent of the domain model.

pub mod common_dto;
pub mod session_dto;
pub mod transaction_dto;

pub use common_dto::*;
pub use session_dto::*;
pub use transaction_dto::*;
