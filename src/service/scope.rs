//! Filter builders that encode who may see what.
//!
//! Every role plan builds its filters from these helpers so the ownership
//! predicates live in one place.

use crate::domain::{DateRange, RequestStatus};
use crate::persistence::{Field, Filter};

/// Requests submitted by `user_id`.
#[must_use]
pub fn owned_by(user_id: &str) -> Filter {
    Filter::all().eq(Field::OwnerUserId, user_id)
}

/// Assignments held by operator `user_id`.
#[must_use]
pub fn operated_by(user_id: &str) -> Filter {
    Filter::all().eq(Field::OperatorId, user_id)
}

/// Requests `user_id` either submitted or is assigned to, as one
/// disjunction so paging and ordering span both sets.
#[must_use]
pub fn owned_or_assigned(user_id: &str) -> Filter {
    Filter::all().or(vec![
        owned_by(user_id),
        Filter::all().has_assignment(operated_by(user_id)),
    ])
}

/// Creation-time window; matches everything when `range` is `None`.
#[must_use]
pub fn window(range: Option<DateRange>) -> Filter {
    match range {
        Some(r) => Filter::all().range(Field::CreatedAt, Some(r.start), Some(r.end)),
        None => Filter::all(),
    }
}

/// Narrows a request filter to a status group.
#[must_use]
pub fn with_status(base: &Filter, group: &[RequestStatus]) -> Filter {
    base.clone().is_in(Field::Status, RequestStatus::names(group))
}

/// Narrows an assignment filter to assignments whose request is in `group`.
#[must_use]
pub fn with_request_status(base: &Filter, group: &[RequestStatus]) -> Filter {
    base.clone().for_request(with_status(&Filter::all(), group))
}

/// Revenue-bearing requests within `base`.
#[must_use]
pub fn paid(base: &Filter) -> Filter {
    with_status(base, RequestStatus::PAID).not_null(Field::EstimatedCost)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn window_is_inclusive_range_or_nothing() {
        assert!(window(None).is_empty());
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).single();
        let (Some(start), Some(end)) = (start, end) else {
            return;
        };
        let f = window(Some(DateRange::new(start, end)));
        assert_eq!(f.range_of(Field::CreatedAt), Some((Some(start), Some(end))));
    }

    #[test]
    fn owned_or_assigned_mentions_both_sides() {
        let f = owned_or_assigned("op1");
        assert!(f.references(Field::OwnerUserId, "op1"));
        assert!(f.references(Field::OperatorId, "op1"));
        assert_eq!(f.eq_value(Field::OwnerUserId), None, "ownership is inside the OR");
    }

    #[test]
    fn status_helpers_keep_base() {
        let base = owned_by("u1");
        let f = with_status(&base, RequestStatus::PENDING_APPROVAL);
        assert_eq!(f.eq_value(Field::OwnerUserId), Some("u1"));
        assert_eq!(f.predicates().len(), 2);
        assert_eq!(paid(&base).predicates().len(), 3);
    }
}
