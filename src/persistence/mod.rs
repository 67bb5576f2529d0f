//! Persistence layer: read-only access to marketplace records.
//!
//! The dashboard never writes. It talks to storage through the
//! [`RecordStore`] trait, which exposes exactly the query shapes the
//! dashboard needs: counts, paged finds with optional relations, and
//! numeric aggregates, all driven by a [`Filter`].
//!
//! Two adapters ship with the crate:
//!
//! - [`PostgresRecordStore`] renders filters into SQL via `sqlx`.
//! - [`InMemoryRecordStore`] evaluates filters over in-process tables and
//!   records every query it receives, for tests and demos.

pub mod filter;
pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

pub use filter::{Field, FieldSource, Filter, Predicate};
pub use memory::{InMemoryRecordStore, QueryKind, QueryRecord};
pub use postgres::PostgresRecordStore;

use crate::domain::{AssignmentRecord, RequestRecord, User};
use crate::error::StoreError;

/// Collection a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// `service_requests`.
    ServiceRequests,
    /// `operator_assignments`.
    OperatorAssignments,
    /// `users`.
    Users,
}

/// Paging of a find.
///
/// Finds always return newest first on the collection's own timestamp
/// (`assigned_at` for assignments, `created_at` otherwise), ties broken by
/// ascending id, so every adapter pages identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindOptions {
    /// Maximum rows returned.
    pub take: u32,
    /// Rows skipped before the first returned one.
    pub skip: u32,
}

impl FindOptions {
    /// Newest-first page of `take` rows after skipping `skip`.
    #[must_use]
    pub const fn page(take: u32, skip: u32) -> Self {
        Self { take, skip }
    }

    /// Newest-first, first `take` rows.
    #[must_use]
    pub const fn first(take: u32) -> Self {
        Self::page(take, 0)
    }
}

/// Relations to load with each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestSelect {
    /// Join the owner's contact details.
    pub owner: bool,
    /// Join the assigned operators.
    pub operators: bool,
}

impl RequestSelect {
    /// Request rows only.
    pub const BARE: Self = Self {
        owner: false,
        operators: false,
    };

    /// Owner and operators, as shown to back-office roles.
    pub const WITH_PARTIES: Self = Self {
        owner: true,
        operators: true,
    };
}

/// Numeric aggregate over service requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    /// Sum of non-null values.
    Sum(Field),
    /// Mean of non-null values.
    Avg(Field),
}

impl Aggregate {
    /// Aggregated field.
    #[must_use]
    pub const fn field(self) -> Field {
        match self {
            Self::Sum(f) | Self::Avg(f) => f,
        }
    }
}

/// Read-only query capability the dashboard depends on.
///
/// Implementations must be safe to call concurrently; a single dashboard
/// call issues several queries in parallel.
#[async_trait]
pub trait RecordStore: Send + Sync + fmt::Debug {
    /// Counts service requests matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot answer.
    async fn count_requests(&self, filter: &Filter) -> Result<u64, StoreError>;

    /// Counts operator assignments matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot answer.
    async fn count_assignments(&self, filter: &Filter) -> Result<u64, StoreError>;

    /// Finds one page of service requests with the selected relations.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot answer.
    async fn find_requests(
        &self,
        filter: &Filter,
        find: FindOptions,
        select: RequestSelect,
    ) -> Result<Vec<RequestRecord>, StoreError>;

    /// Finds one page of assignments, each with its request headline.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot answer.
    async fn find_assignments(
        &self,
        filter: &Filter,
        find: FindOptions,
    ) -> Result<Vec<AssignmentRecord>, StoreError>;

    /// Finds one page of users.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot answer.
    async fn find_users(&self, filter: &Filter, find: FindOptions) -> Result<Vec<User>, StoreError>;

    /// Computes a sum or mean over matching service requests. `None` when
    /// no matching row has a value.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot answer.
    async fn aggregate_requests(
        &self,
        filter: &Filter,
        aggregate: Aggregate,
    ) -> Result<Option<f64>, StoreError>;

    /// Tells the adapter about an offline-mode switch. Adapters without an
    /// offline notion ignore it.
    fn set_offline_mode(&self, enabled: bool) {
        tracing::debug!(enabled, "record store ignores offline mode");
    }
}
