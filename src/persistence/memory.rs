//! In-process [`RecordStore`] for tests, demos and local runs.
//!
//! Rows live in plain vectors behind an `RwLock`. Every query is appended
//! to a log before it is answered, so tests can assert on the exact
//! filters a dashboard issued and on how many round trips it made.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::filter::{Field, FieldSource, Filter, Predicate};
use super::{Aggregate, Collection, FindOptions, RecordStore, RequestSelect};
use crate::domain::{
    AssignmentRecord, OperatorAssignment, OperatorContact, OwnerContact, RequestHeadline,
    RequestRecord, ServiceRequest, User,
};
use crate::error::StoreError;

/// Shape of a logged query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// A count.
    Count,
    /// A paged find.
    Find,
    /// A sum or mean.
    Aggregate(Aggregate),
}

/// One query received by an [`InMemoryRecordStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRecord {
    /// Target collection.
    pub collection: Collection,
    /// Query shape.
    pub kind: QueryKind,
    /// Filter as received.
    pub filter: Filter,
}

#[derive(Debug, Default)]
struct Tables {
    requests: Vec<ServiceRequest>,
    assignments: Vec<OperatorAssignment>,
    users: Vec<User>,
}

impl Tables {
    fn request_matches(&self, request: &ServiceRequest, filter: &Filter) -> bool {
        filter.matches(request, &|p| match p {
            Predicate::HasAssignment(inner) => self.assignments.iter().any(|a| {
                a.service_request_id == request.id && self.assignment_matches(a, inner)
            }),
            _ => false,
        })
    }

    fn assignment_matches(&self, assignment: &OperatorAssignment, filter: &Filter) -> bool {
        filter.matches(assignment, &|p| match p {
            Predicate::ForRequest(inner) => self
                .request(&assignment.service_request_id)
                .is_some_and(|r| self.request_matches(r, inner)),
            _ => false,
        })
    }

    fn request(&self, id: &str) -> Option<&ServiceRequest> {
        self.requests.iter().find(|r| r.id == id)
    }

    fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn owner_contact(&self, request: &ServiceRequest) -> Option<OwnerContact> {
        self.user(&request.owner_user_id).map(|u| OwnerContact {
            name: u.name.clone(),
            email: u.email.clone(),
            company: u.company.clone(),
        })
    }

    fn operator_contacts(&self, request: &ServiceRequest) -> Vec<OperatorContact> {
        let mut links: Vec<&OperatorAssignment> = self
            .assignments
            .iter()
            .filter(|a| a.service_request_id == request.id)
            .collect();
        links.sort_by_key(|a| a.assigned_at);
        links
            .into_iter()
            .filter_map(|a| {
                self.user(&a.operator_id).map(|u| OperatorContact {
                    id: u.id.clone(),
                    name: u.name.clone(),
                    email: u.email.clone(),
                })
            })
            .collect()
    }
}

/// Newest first, then ascending id; matches the SQL adapter's `ORDER BY`.
fn newest_first(a: (DateTime<Utc>, &str), b: (DateTime<Utc>, &str)) -> Ordering {
    b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

fn page<T>(rows: Vec<T>, find: FindOptions) -> Vec<T> {
    let skip = usize::try_from(find.skip).unwrap_or(usize::MAX);
    let take = usize::try_from(find.take).unwrap_or(usize::MAX);
    rows.into_iter().skip(skip).take(take).collect()
}

/// [`RecordStore`] over in-process tables.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    tables: RwLock<Tables>,
    log: Mutex<Vec<QueryRecord>>,
    failure: Mutex<Option<String>>,
    offline: AtomicBool,
}

impl InMemoryRecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a service request.
    pub fn insert_request(&self, request: ServiceRequest) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .requests
            .push(request);
    }

    /// Inserts an operator assignment.
    pub fn insert_assignment(&self, assignment: OperatorAssignment) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .assignments
            .push(assignment);
    }

    /// Inserts a user.
    pub fn insert_user(&self, user: User) {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .users
            .push(user);
    }

    /// Makes every subsequent query fail with [`StoreError::Unavailable`].
    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = Some(reason.into());
    }

    /// Clears an injected failure.
    pub fn recover(&self) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Snapshot of every query received so far.
    pub fn queries(&self) -> Vec<QueryRecord> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of queries received so far.
    pub fn query_count(&self) -> usize {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Last offline-mode value pushed by the service.
    pub fn is_offline(&self) -> bool {
        self.offline.load(AtomicOrdering::Relaxed)
    }

    fn record(&self, collection: Collection, kind: QueryKind, filter: &Filter) -> Result<(), StoreError> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(QueryRecord {
                collection,
                kind,
                filter: filter.clone(),
            });
        match self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn count_requests(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.record(Collection::ServiceRequests, QueryKind::Count, filter)?;
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let n = tables
            .requests
            .iter()
            .filter(|r| tables.request_matches(r, filter))
            .count();
        Ok(n as u64)
    }

    async fn count_assignments(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.record(Collection::OperatorAssignments, QueryKind::Count, filter)?;
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let n = tables
            .assignments
            .iter()
            .filter(|a| tables.assignment_matches(a, filter))
            .count();
        Ok(n as u64)
    }

    async fn find_requests(
        &self,
        filter: &Filter,
        find: FindOptions,
        select: RequestSelect,
    ) -> Result<Vec<RequestRecord>, StoreError> {
        self.record(Collection::ServiceRequests, QueryKind::Find, filter)?;
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let mut rows: Vec<&ServiceRequest> = tables
            .requests
            .iter()
            .filter(|r| tables.request_matches(r, filter))
            .collect();
        rows.sort_by(|a, b| {
            newest_first((a.created_at, a.id.as_str()), (b.created_at, b.id.as_str()))
        });
        Ok(page(rows, find)
            .into_iter()
            .map(|r| RequestRecord {
                request: r.clone(),
                owner: if select.owner {
                    tables.owner_contact(r)
                } else {
                    None
                },
                operators: select.operators.then(|| tables.operator_contacts(r)),
            })
            .collect())
    }

    async fn find_assignments(
        &self,
        filter: &Filter,
        find: FindOptions,
    ) -> Result<Vec<AssignmentRecord>, StoreError> {
        self.record(Collection::OperatorAssignments, QueryKind::Find, filter)?;
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let mut rows: Vec<(&OperatorAssignment, &ServiceRequest)> = tables
            .assignments
            .iter()
            .filter(|a| tables.assignment_matches(a, filter))
            .filter_map(|a| tables.request(&a.service_request_id).map(|r| (a, r)))
            .collect();
        rows.sort_by(|(a, _), (b, _)| {
            newest_first((a.assigned_at, a.id.as_str()), (b.assigned_at, b.id.as_str()))
        });
        Ok(page(rows, find)
            .into_iter()
            .map(|(a, r)| AssignmentRecord {
                assignment: a.clone(),
                request: RequestHeadline::from(r),
            })
            .collect())
    }

    async fn find_users(&self, filter: &Filter, find: FindOptions) -> Result<Vec<User>, StoreError> {
        self.record(Collection::Users, QueryKind::Find, filter)?;
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let mut rows: Vec<&User> = tables
            .users
            .iter()
            .filter(|u| filter.matches(*u, &|_| false))
            .collect();
        rows.sort_by(|a, b| {
            newest_first((a.created_at, a.id.as_str()), (b.created_at, b.id.as_str()))
        });
        Ok(page(rows, find).into_iter().cloned().collect())
    }

    async fn aggregate_requests(
        &self,
        filter: &Filter,
        aggregate: Aggregate,
    ) -> Result<Option<f64>, StoreError> {
        self.record(
            Collection::ServiceRequests,
            QueryKind::Aggregate(aggregate),
            filter,
        )?;
        let field = aggregate.field();
        if !matches!(field, Field::EstimatedCost | Field::TotalHours) {
            return Err(StoreError::UnsupportedFilter(format!(
                "cannot aggregate {field:?}"
            )));
        }
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let values: Vec<f64> = tables
            .requests
            .iter()
            .filter(|r| tables.request_matches(r, filter))
            .filter_map(|r| r.number(field))
            .collect();
        if values.is_empty() {
            return Ok(None);
        }
        let sum: f64 = values.iter().sum();
        Ok(Some(match aggregate {
            Aggregate::Sum(_) => sum,
            Aggregate::Avg(_) => sum / values.len() as f64,
        }))
    }

    fn set_offline_mode(&self, enabled: bool) {
        self.offline.store(enabled, AtomicOrdering::Relaxed);
    }
}
