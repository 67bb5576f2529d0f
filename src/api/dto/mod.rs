//! Data Transfer Objects for REST request/response serialization.
//!
//! Dashboard payloads themselves are the domain types; the DTOs here add
//! the query string, response metadata and admin request bodies.

pub mod dashboard_dto;

pub use dashboard_dto::*;
