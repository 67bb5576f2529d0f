//! Store-agnostic query predicates.
//!
//! A [`Filter`] is a conjunction of [`Predicate`]s. Adapters either render
//! it (see [`super::postgres`]) or evaluate it against in-memory rows (see
//! [`super::memory`]). Filters are plain data so tests can inspect exactly
//! what a dashboard asked the store for.

use chrono::{DateTime, Utc};

use crate::domain::{OperatorAssignment, ServiceRequest, User};

/// A column the dashboard filters or aggregates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Primary key of any collection.
    Id,
    /// `service_requests.owner_user_id`.
    OwnerUserId,
    /// Request status, or assignment status on assignments.
    Status,
    /// Creation timestamp of a request or user.
    CreatedAt,
    /// `service_requests.estimated_cost`.
    EstimatedCost,
    /// `service_requests.total_hours`.
    TotalHours,
    /// `operator_assignments.operator_id`.
    OperatorId,
    /// `operator_assignments.service_request_id`.
    ServiceRequestId,
    /// `operator_assignments.assigned_at`.
    AssignedAt,
    /// `users.role`.
    Role,
}

/// One condition in a [`Filter`].
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `field = value`.
    Eq(Field, String),
    /// `field IN (values)`.
    In(Field, Vec<String>),
    /// `field NOT IN (values)`.
    NotIn(Field, Vec<String>),
    /// `gte <= field <= lte`; an open bound is unconstrained.
    Range {
        /// Constrained timestamp column.
        field: Field,
        /// Inclusive lower bound.
        gte: Option<DateTime<Utc>>,
        /// Inclusive upper bound.
        lte: Option<DateTime<Utc>>,
    },
    /// `field IS NOT NULL`.
    NotNull(Field),
    /// Any of the alternatives holds.
    Or(Vec<Filter>),
    /// On requests: some assignment of the request matches.
    HasAssignment(Filter),
    /// On assignments: the assigned request matches.
    ForRequest(Filter),
}

/// Conjunction of predicates. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    /// The match-everything filter.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    /// Adds `field = value`.
    #[must_use]
    pub fn eq(mut self, field: Field, value: impl Into<String>) -> Self {
        self.predicates.push(Predicate::Eq(field, value.into()));
        self
    }

    /// Adds `field IN (values)`.
    #[must_use]
    pub fn is_in(mut self, field: Field, values: Vec<String>) -> Self {
        self.predicates.push(Predicate::In(field, values));
        self
    }

    /// Adds `field NOT IN (values)`.
    #[must_use]
    pub fn not_in(mut self, field: Field, values: Vec<String>) -> Self {
        self.predicates.push(Predicate::NotIn(field, values));
        self
    }

    /// Adds an inclusive timestamp range.
    #[must_use]
    pub fn range(
        mut self,
        field: Field,
        gte: Option<DateTime<Utc>>,
        lte: Option<DateTime<Utc>>,
    ) -> Self {
        self.predicates.push(Predicate::Range { field, gte, lte });
        self
    }

    /// Adds `field IS NOT NULL`.
    #[must_use]
    pub fn not_null(mut self, field: Field) -> Self {
        self.predicates.push(Predicate::NotNull(field));
        self
    }

    /// Adds a disjunction of `alternatives`.
    #[must_use]
    pub fn or(mut self, alternatives: Vec<Self>) -> Self {
        self.predicates.push(Predicate::Or(alternatives));
        self
    }

    /// Requires some assignment of the request to match `inner`.
    #[must_use]
    pub fn has_assignment(mut self, inner: Self) -> Self {
        self.predicates.push(Predicate::HasAssignment(inner));
        self
    }

    /// Requires the assignment's request to match `inner`.
    #[must_use]
    pub fn for_request(mut self, inner: Self) -> Self {
        self.predicates.push(Predicate::ForRequest(inner));
        self
    }

    /// The predicates, in insertion order.
    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Returns `true` for the match-everything filter.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Value of a top-level `field = value` predicate.
    #[must_use]
    pub fn eq_value(&self, field: Field) -> Option<&str> {
        self.predicates.iter().find_map(|p| match p {
            Predicate::Eq(f, v) if *f == field => Some(v.as_str()),
            _ => None,
        })
    }

    /// Bounds of a top-level range predicate on `field`.
    #[must_use]
    pub fn range_of(&self, field: Field) -> Option<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        self.predicates.iter().find_map(|p| match p {
            Predicate::Range { field: f, gte, lte } if *f == field => Some((*gte, *lte)),
            _ => None,
        })
    }

    /// Returns `true` if `field = value` appears anywhere, including
    /// inside disjunctions and relation predicates.
    #[must_use]
    pub fn references(&self, field: Field, value: &str) -> bool {
        self.predicates.iter().any(|p| match p {
            Predicate::Eq(f, v) => *f == field && v == value,
            Predicate::Or(alts) => alts.iter().any(|alt| alt.references(field, value)),
            Predicate::HasAssignment(inner) | Predicate::ForRequest(inner) => {
                inner.references(field, value)
            }
            _ => false,
        })
    }

    /// Evaluates the filter against one record.
    ///
    /// Relation predicates need the other collection, so they are handed
    /// to `relation`, which the adapter implements.
    pub fn matches<R: FieldSource>(&self, record: &R, relation: &dyn Fn(&Predicate) -> bool) -> bool {
        self.predicates.iter().all(|p| match p {
            Predicate::Eq(f, v) => record.text(*f).is_some_and(|x| x == v),
            Predicate::In(f, vs) => record.text(*f).is_some_and(|x| vs.iter().any(|v| v == x)),
            Predicate::NotIn(f, vs) => record.text(*f).is_some_and(|x| vs.iter().all(|v| v != x)),
            Predicate::Range { field, gte, lte } => record.timestamp(*field).is_some_and(|t| {
                gte.is_none_or(|lo| t >= lo) && lte.is_none_or(|hi| t <= hi)
            }),
            Predicate::NotNull(f) => record.is_present(*f),
            Predicate::Or(alts) => alts.iter().any(|alt| alt.matches(record, relation)),
            Predicate::HasAssignment(_) | Predicate::ForRequest(_) => relation(p),
        })
    }
}

/// Field access used by in-memory evaluation.
pub trait FieldSource {
    /// Text (or enum wire name) value of `field`.
    fn text(&self, field: Field) -> Option<&str>;

    /// Timestamp value of `field`.
    fn timestamp(&self, field: Field) -> Option<DateTime<Utc>>;

    /// Numeric value of `field`.
    fn number(&self, field: Field) -> Option<f64>;

    /// Returns `true` if `field` holds a non-null value.
    fn is_present(&self, field: Field) -> bool {
        self.text(field).is_some() || self.timestamp(field).is_some() || self.number(field).is_some()
    }
}

impl FieldSource for ServiceRequest {
    fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::Id => Some(&self.id),
            Field::OwnerUserId => Some(&self.owner_user_id),
            Field::Status => Some(self.status.as_str()),
            _ => None,
        }
    }

    fn timestamp(&self, field: Field) -> Option<DateTime<Utc>> {
        match field {
            Field::CreatedAt => Some(self.created_at),
            _ => None,
        }
    }

    fn number(&self, field: Field) -> Option<f64> {
        match field {
            Field::EstimatedCost => self.estimated_cost,
            Field::TotalHours => self.total_hours,
            _ => None,
        }
    }
}

impl FieldSource for OperatorAssignment {
    fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::Id => Some(&self.id),
            Field::OperatorId => Some(&self.operator_id),
            Field::ServiceRequestId => Some(&self.service_request_id),
            Field::Status => Some(self.status.as_str()),
            _ => None,
        }
    }

    fn timestamp(&self, field: Field) -> Option<DateTime<Utc>> {
        match field {
            Field::AssignedAt => Some(self.assigned_at),
            _ => None,
        }
    }

    fn number(&self, _field: Field) -> Option<f64> {
        None
    }
}

impl FieldSource for User {
    fn text(&self, field: Field) -> Option<&str> {
        match field {
            Field::Id => Some(&self.id),
            Field::Role => Some(self.role.as_str()),
            _ => None,
        }
    }

    fn timestamp(&self, field: Field) -> Option<DateTime<Utc>> {
        match field {
            Field::CreatedAt => Some(self.created_at),
            _ => None,
        }
    }

    fn number(&self, _field: Field) -> Option<f64> {
        None
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::domain::RequestStatus;

    fn request(owner: &str, status: RequestStatus, cost: Option<f64>) -> ServiceRequest {
        let Some(at) = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).single() else {
            panic!("valid date");
        };
        ServiceRequest {
            id: "r1".to_string(),
            title: "Trench".to_string(),
            status,
            owner_user_id: owner.to_string(),
            equipment_category: "TRENCHERS".to_string(),
            job_site: "Lot 4".to_string(),
            start_date: at,
            end_date: None,
            duration_type: "FULL_DAY".to_string(),
            duration_value: 1,
            total_hours: None,
            estimated_cost: cost,
            created_at: at,
            updated_at: at,
        }
    }

    fn no_relations(_: &Predicate) -> bool {
        false
    }

    #[test]
    fn empty_filter_matches_everything() {
        let r = request("u1", RequestStatus::Submitted, None);
        assert!(Filter::all().matches(&r, &no_relations));
    }

    #[test]
    fn conjunction_of_eq_and_in() {
        let r = request("u1", RequestStatus::Submitted, None);
        let f = Filter::all()
            .eq(Field::OwnerUserId, "u1")
            .is_in(Field::Status, RequestStatus::names(RequestStatus::PENDING_APPROVAL));
        assert!(f.matches(&r, &no_relations));

        let other_owner = Filter::all().eq(Field::OwnerUserId, "u2");
        assert!(!other_owner.matches(&r, &no_relations));
    }

    #[test]
    fn not_in_and_not_null() {
        let r = request("u1", RequestStatus::Closed, None);
        let f = Filter::all().not_in(Field::Status, vec!["CLOSED".to_string()]);
        assert!(!f.matches(&r, &no_relations));
        assert!(!Filter::all().not_null(Field::EstimatedCost).matches(&r, &no_relations));

        let priced = request("u1", RequestStatus::Closed, Some(10.0));
        assert!(Filter::all().not_null(Field::EstimatedCost).matches(&priced, &no_relations));
    }

    #[test]
    fn range_is_inclusive() {
        let r = request("u1", RequestStatus::Submitted, None);
        let at = r.created_at;
        let f = Filter::all().range(Field::CreatedAt, Some(at), Some(at));
        assert!(f.matches(&r, &no_relations));
        let after = Filter::all().range(Field::CreatedAt, Some(at + chrono::Duration::seconds(1)), None);
        assert!(!after.matches(&r, &no_relations));
    }

    #[test]
    fn or_delegates_relations() {
        let r = request("someone-else", RequestStatus::OperatorAssigned, None);
        let f = Filter::all().or(vec![
            Filter::all().eq(Field::OwnerUserId, "op1"),
            Filter::all().has_assignment(Filter::all().eq(Field::OperatorId, "op1")),
        ]);
        assert!(!f.matches(&r, &no_relations));
        assert!(f.matches(&r, &|p| matches!(p, Predicate::HasAssignment(_))));
    }

    #[test]
    fn inspection_helpers() {
        let f = Filter::all()
            .eq(Field::OwnerUserId, "u1")
            .range(Field::CreatedAt, None, None)
            .or(vec![Filter::all().has_assignment(Filter::all().eq(Field::OperatorId, "op9"))]);
        assert_eq!(f.eq_value(Field::OwnerUserId), Some("u1"));
        assert_eq!(f.eq_value(Field::OperatorId), None);
        assert_eq!(f.range_of(Field::CreatedAt), Some((None, None)));
        assert!(f.references(Field::OperatorId, "op9"));
        assert!(!f.references(Field::OperatorId, "op1"));
    }
}
