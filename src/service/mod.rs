//! Service layer: business logic orchestration.
//!
//! [`DashboardService`] validates dashboard calls, serves them from the
//! cache when it can, and otherwise runs the role plan in [`assembler`]
//! against a [`crate::persistence::RecordStore`].

pub mod assembler;
pub mod dashboard_service;
pub mod scope;

pub use dashboard_service::{DashboardFetch, DashboardService};
