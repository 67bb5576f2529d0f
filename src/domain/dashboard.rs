//! Role-shaped dashboard aggregates.
//!
//! The JSON shape of [`DashboardResult`] is part of the contract: which
//! optional keys are present depends on the role that produced it, and an
//! absent key is never serialized as `null`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::records::{
    AssignmentRecord, OperatorContact, OwnerContact, RequestHeadline, RequestRecord, User,
};
use super::role::UserRole;
use super::status::{AssignmentStatus, RequestStatus};

/// Headline counters.
///
/// `revenue` is present for MANAGER and ADMIN, `average_job_duration`
/// for ADMIN only.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Requests (or, for operators, assignments plus own requests) in scope.
    pub total_requests: u64,
    /// In-flight requests.
    pub active_requests: u64,
    /// Finished requests.
    pub completed_requests: u64,
    /// Requests waiting on review.
    pub pending_approval: u64,
    /// Sum of estimated cost over paid requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,
    /// Mean requested hours over completed requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_job_duration: Option<f64>,
}

/// A service request row as shown on a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    /// Request id.
    pub id: String,
    /// Title.
    pub title: String,
    /// Status.
    pub status: RequestStatus,
    /// Equipment category code.
    pub equipment_category: String,
    /// Job site.
    pub job_site: String,
    /// Requested start.
    pub start_date: DateTime<Utc>,
    /// Requested end.
    pub end_date: Option<DateTime<Utc>>,
    /// Duration unit.
    pub duration_type: String,
    /// Duration units.
    pub duration_value: i32,
    /// Requested total hours, 0 when unknown.
    pub total_hours: f64,
    /// Estimated cost rounded to cents.
    pub estimated_cost: Option<f64>,
    /// Created.
    pub created_at: DateTime<Utc>,
    /// Updated.
    pub updated_at: DateTime<Utc>,
    /// Owner contact; back-office views only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<OwnerContact>,
    /// Assigned operators; back-office views only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_operators: Option<Vec<OperatorContact>>,
}

impl From<RequestRecord> for RequestSummary {
    fn from(record: RequestRecord) -> Self {
        let r = record.request;
        Self {
            id: r.id,
            title: r.title,
            status: r.status,
            equipment_category: r.equipment_category,
            job_site: r.job_site,
            start_date: r.start_date,
            end_date: r.end_date,
            duration_type: r.duration_type,
            duration_value: r.duration_value,
            total_hours: r.total_hours.map_or(0.0, round_hours),
            estimated_cost: r.estimated_cost.map(round_currency),
            created_at: r.created_at,
            updated_at: r.updated_at,
            user: record.owner,
            assigned_operators: record.operators,
        }
    }
}

/// An operator assignment as shown on a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSummary {
    /// Assignment id.
    pub id: String,
    /// Request id.
    pub service_request_id: String,
    /// Operator id.
    pub operator_id: String,
    /// When assigned.
    pub assigned_at: DateTime<Utc>,
    /// Assignment status.
    pub status: AssignmentStatus,
    /// Request headline.
    pub service_request: RequestHeadline,
}

impl From<AssignmentRecord> for AssignmentSummary {
    fn from(record: AssignmentRecord) -> Self {
        let a = record.assignment;
        Self {
            id: a.id,
            service_request_id: a.service_request_id,
            operator_id: a.operator_id,
            assigned_at: a.assigned_at,
            status: a.status,
            service_request: record.request,
        }
    }
}

/// A roster entry on the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// User id.
    pub id: String,
    /// Display name.
    pub name: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// Role as stored.
    pub role: UserRole,
    /// Company.
    pub company: Option<String>,
    /// Sign-up timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserSummary {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            company: u.company,
            created_at: u.created_at,
        }
    }
}

/// The assembled dashboard for one principal.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResult {
    /// Headline counters.
    pub stats: DashboardStats,
    /// Most recent requests in scope, newest first.
    pub recent_requests: Vec<RequestSummary>,
    /// Assignments in scope; OPERATOR, MANAGER and ADMIN only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignments: Option<Vec<AssignmentSummary>>,
    /// Recent sign-ups; ADMIN only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<UserSummary>>,
}

/// Rounds a currency amount to cents.
#[must_use]
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rounds an hour count to four decimal places.
#[must_use]
pub fn round_hours(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn stats() -> DashboardStats {
        DashboardStats {
            total_requests: 3,
            active_requests: 1,
            completed_requests: 1,
            pending_approval: 1,
            revenue: None,
            average_job_duration: None,
        }
    }

    #[test]
    fn optional_stats_are_omitted_not_null() {
        let json = serde_json::to_value(stats()).unwrap_or_default();
        let Some(obj) = json.as_object() else {
            panic!("stats should serialize as an object");
        };
        assert_eq!(obj.len(), 4);
        assert!(!obj.contains_key("revenue"));
        assert!(obj.contains_key("pendingApproval"));
    }

    #[test]
    fn optional_sections_are_omitted() {
        let result = DashboardResult {
            stats: stats(),
            recent_requests: Vec::new(),
            assignments: None,
            users: None,
        };
        let json = serde_json::to_value(result).unwrap_or_default();
        assert!(json.get("assignments").is_none());
        assert!(json.get("users").is_none());
        assert!(json.get("recentRequests").is_some());
    }

    #[test]
    fn rounding() {
        assert!((round_currency(10.005_1) - 10.01).abs() < f64::EPSILON);
        assert!((round_currency(99.994) - 99.99).abs() < f64::EPSILON);
        assert!((round_hours(7.123_456) - 7.123_5).abs() < 1e-9);
    }
}
