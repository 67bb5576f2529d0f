//! # rental-dashboard
//!
//! Role-scoped dashboard aggregation for an equipment-rental marketplace.
//!
//! A caller identified by user id and role gets a dashboard shaped for that
//! role: request counts by workflow stage, a page of recent requests, and,
//! depending on the role, operator assignments, revenue, average job
//! duration and the user roster. Results are cached in process with a TTL.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers + Principal extractor (api/)
//!     │
//!     ├── DashboardService (service/)
//!     │       ├── role plans (assembler)
//!     │       └── CacheStore (cache/)
//!     │
//!     ├── RecordStore trait (persistence/)
//!     │       ├── PostgresRecordStore
//!     │       └── InMemoryRecordStore
//!     │
//!     └── PostgreSQL
//! ```
//!
//! ## Library use
//!
//! ```no_run
//! # async fn demo() {
//! use std::sync::Arc;
//!
//! use rental_dashboard::cache::CacheStore;
//! use rental_dashboard::domain::{CacheOptions, DashboardOptions};
//! use rental_dashboard::persistence::InMemoryRecordStore;
//! use rental_dashboard::service::DashboardService;
//!
//! let service = DashboardService::new(
//!     Arc::new(InMemoryRecordStore::new()),
//!     Arc::new(CacheStore::new()),
//! );
//! let result = service
//!     .get_dashboard_data(&DashboardOptions::new("u-1", "USER"), &CacheOptions::enabled())
//!     .await;
//! assert!(result.is_success());
//! # }
//! ```

pub mod api;
pub mod app_state;
pub mod cache;
pub mod config;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod persistence;
pub mod service;
