//! Marketplace records as read from the record store.
//!
//! The dashboard owns none of these; they are read-only snapshots of rows
//! owned by the request, assignment and user tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::role::UserRole;
use super::status::{AssignmentStatus, RequestStatus};

/// A customer's request for equipment plus operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    /// Primary key.
    pub id: String,
    /// Short human-readable title.
    pub title: String,
    /// Current workflow state.
    pub status: RequestStatus,
    /// Submitting user. Immutable after creation.
    pub owner_user_id: String,
    /// Equipment category code (e.g. `"EXCAVATORS"`).
    pub equipment_category: String,
    /// Job site address.
    pub job_site: String,
    /// Requested start.
    pub start_date: DateTime<Utc>,
    /// Requested end, if bounded.
    pub end_date: Option<DateTime<Utc>>,
    /// Duration unit (e.g. `"FULL_DAY"`).
    pub duration_type: String,
    /// Number of duration units.
    pub duration_value: i32,
    /// Requested total hours.
    pub total_hours: Option<f64>,
    /// Estimated cost in account currency.
    pub estimated_cost: Option<f64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Link between one service request and one operator.
///
/// Reassignment inserts a new row; `operator_id` never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorAssignment {
    /// Primary key.
    pub id: String,
    /// Request being worked.
    pub service_request_id: String,
    /// Assigned operator's user id.
    pub operator_id: String,
    /// Assignment state.
    pub status: AssignmentStatus,
    /// Agreed hourly rate.
    pub rate: Option<f64>,
    /// Estimated hours.
    pub estimated_hours: Option<f64>,
    /// Hours actually worked.
    pub actual_hours: Option<f64>,
    /// When the assignment was made.
    pub assigned_at: DateTime<Utc>,
    /// When the operator accepted.
    pub accepted_at: Option<DateTime<Utc>>,
    /// When the work was signed off.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Operator-only profile fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatorProfile {
    /// Branch of prior military service.
    pub military_branch: Option<String>,
    /// Years of service.
    pub years_of_service: Option<i32>,
    /// Held equipment certifications.
    pub certifications: Vec<String>,
    /// Preferred working locations.
    pub preferred_locations: Vec<String>,
    /// Whether the operator is taking new jobs.
    pub is_available: bool,
}

/// A marketplace account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Primary key.
    pub id: String,
    /// Display name.
    pub name: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Account role.
    pub role: UserRole,
    /// Company name.
    pub company: Option<String>,
    /// Sign-up timestamp.
    pub created_at: DateTime<Utc>,
    /// Present for operators only.
    pub operator_profile: Option<OperatorProfile>,
}

/// Contact details of a request's owner, joined for back-office views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OwnerContact {
    /// Owner display name.
    pub name: Option<String>,
    /// Owner email.
    pub email: Option<String>,
    /// Owner company.
    pub company: Option<String>,
}

/// Identity of an operator assigned to a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OperatorContact {
    /// Operator user id.
    pub id: String,
    /// Operator display name.
    pub name: Option<String>,
    /// Operator email.
    pub email: Option<String>,
}

/// The slice of a service request shown next to an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestHeadline {
    /// Request title.
    pub title: String,
    /// Job site.
    pub job_site: String,
    /// Requested start.
    pub start_date: DateTime<Utc>,
    /// Requested end.
    pub end_date: Option<DateTime<Utc>>,
    /// Request status.
    pub status: RequestStatus,
}

impl From<&ServiceRequest> for RequestHeadline {
    fn from(r: &ServiceRequest) -> Self {
        Self {
            title: r.title.clone(),
            job_site: r.job_site.clone(),
            start_date: r.start_date,
            end_date: r.end_date,
            status: r.status,
        }
    }
}

/// A service request together with whichever relations were selected.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    /// The request row.
    pub request: ServiceRequest,
    /// Owner contact, when [`RequestSelect::owner`](crate::persistence::RequestSelect) was set.
    pub owner: Option<OwnerContact>,
    /// Assigned operators, when [`RequestSelect::operators`](crate::persistence::RequestSelect) was set.
    pub operators: Option<Vec<OperatorContact>>,
}

/// An assignment together with its request headline.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentRecord {
    /// The assignment row.
    pub assignment: OperatorAssignment,
    /// Headline of the request it belongs to.
    pub request: RequestHeadline,
}
