//! Database row models and their mapping into domain records.

use chrono::{DateTime, Utc};

use crate::domain::{
    AssignmentRecord, OperatorAssignment, OperatorContact, OperatorProfile, OwnerContact,
    RequestHeadline, ServiceRequest, User, UserRole,
};
use crate::error::StoreError;

fn decode<T: std::str::FromStr>(column: &str, raw: &str) -> Result<T, StoreError> {
    raw.parse()
        .map_err(|_| StoreError::Decode(format!("unexpected {column} value {raw:?}")))
}

/// A `service_requests` row joined with its owner's contact columns.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RequestRow {
    /// Primary key.
    pub id: String,
    /// Title.
    pub title: String,
    /// Status wire name.
    pub status: String,
    /// Owner user id.
    pub owner_user_id: String,
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
    /// Requested total hours.
    pub total_hours: Option<f64>,
    /// Estimated cost.
    pub estimated_cost: Option<f64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Joined owner id; `None` when the owner row is missing.
    pub owner_id: Option<String>,
    /// Joined owner name.
    pub owner_name: Option<String>,
    /// Joined owner email.
    pub owner_email: Option<String>,
    /// Joined owner company.
    pub owner_company: Option<String>,
}

impl RequestRow {
    /// Owner contact, if the join found the owner.
    #[must_use]
    pub fn owner_contact(&self) -> Option<OwnerContact> {
        self.owner_id.as_ref().map(|_| OwnerContact {
            name: self.owner_name.clone(),
            email: self.owner_email.clone(),
            company: self.owner_company.clone(),
        })
    }

    /// Maps the row into a [`ServiceRequest`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Decode`] for an unknown status.
    pub fn into_request(self) -> Result<ServiceRequest, StoreError> {
        Ok(ServiceRequest {
            status: decode("service_requests.status", &self.status)?,
            id: self.id,
            title: self.title,
            owner_user_id: self.owner_user_id,
            equipment_category: self.equipment_category,
            job_site: self.job_site,
            start_date: self.start_date,
            end_date: self.end_date,
            duration_type: self.duration_type,
            duration_value: self.duration_value,
            total_hours: self.total_hours,
            estimated_cost: self.estimated_cost,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// An `operator_assignments` row joined with its request headline.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AssignmentRow {
    /// Primary key.
    pub id: String,
    /// Request id.
    pub service_request_id: String,
    /// Operator user id.
    pub operator_id: String,
    /// Assignment status wire name.
    pub status: String,
    /// Hourly rate.
    pub rate: Option<f64>,
    /// Estimated hours.
    pub estimated_hours: Option<f64>,
    /// Actual hours.
    pub actual_hours: Option<f64>,
    /// Assignment timestamp.
    pub assigned_at: DateTime<Utc>,
    /// Acceptance timestamp.
    pub accepted_at: Option<DateTime<Utc>>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Request title.
    pub request_title: String,
    /// Request job site.
    pub request_job_site: String,
    /// Request start.
    pub request_start_date: DateTime<Utc>,
    /// Request end.
    pub request_end_date: Option<DateTime<Utc>>,
    /// Request status wire name.
    pub request_status: String,
}

impl TryFrom<AssignmentRow> for AssignmentRecord {
    type Error = StoreError;

    fn try_from(row: AssignmentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            request: RequestHeadline {
                title: row.request_title,
                job_site: row.request_job_site,
                start_date: row.request_start_date,
                end_date: row.request_end_date,
                status: decode("service_requests.status", &row.request_status)?,
            },
            assignment: OperatorAssignment {
                status: decode("operator_assignments.status", &row.status)?,
                id: row.id,
                service_request_id: row.service_request_id,
                operator_id: row.operator_id,
                rate: row.rate,
                estimated_hours: row.estimated_hours,
                actual_hours: row.actual_hours,
                assigned_at: row.assigned_at,
                accepted_at: row.accepted_at,
                completed_at: row.completed_at,
            },
        })
    }
}

/// A `users` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    /// Primary key.
    pub id: String,
    /// Display name.
    pub name: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// Role wire name.
    pub role: String,
    /// Company.
    pub company: Option<String>,
    /// Sign-up timestamp.
    pub created_at: DateTime<Utc>,
    /// Operator military branch.
    pub military_branch: Option<String>,
    /// Operator years of service.
    pub years_of_service: Option<i32>,
    /// Operator certifications.
    pub certifications: Vec<String>,
    /// Operator preferred locations.
    pub preferred_locations: Vec<String>,
    /// Operator availability.
    pub is_available: bool,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: UserRole = decode("users.role", &row.role)?;
        let operator_profile = (role == UserRole::Operator).then(|| OperatorProfile {
            military_branch: row.military_branch,
            years_of_service: row.years_of_service,
            certifications: row.certifications,
            preferred_locations: row.preferred_locations,
            is_available: row.is_available,
        });
        Ok(Self {
            id: row.id,
            name: row.name,
            email: row.email,
            role,
            company: row.company,
            created_at: row.created_at,
            operator_profile,
        })
    }
}

/// One operator linked to a request, as loaded for back-office views.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OperatorLinkRow {
    /// Request the operator is assigned to.
    pub service_request_id: String,
    /// Operator user id.
    pub id: String,
    /// Operator name.
    pub name: Option<String>,
    /// Operator email.
    pub email: Option<String>,
}

impl From<OperatorLinkRow> for OperatorContact {
    fn from(row: OperatorLinkRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::RequestStatus;

    fn user_row(role: &str) -> UserRow {
        UserRow {
            id: "u1".to_string(),
            name: None,
            email: None,
            role: role.to_string(),
            company: None,
            created_at: Utc::now(),
            military_branch: Some("NAVY".to_string()),
            years_of_service: Some(6),
            certifications: vec!["CRANE".to_string()],
            preferred_locations: Vec::new(),
            is_available: true,
        }
    }

    #[test]
    fn operator_rows_carry_a_profile() {
        let Ok(user) = User::try_from(user_row("OPERATOR")) else {
            panic!("decode failed");
        };
        assert_eq!(
            user.operator_profile.map(|p| p.certifications),
            Some(vec!["CRANE".to_string()])
        );
        let Ok(plain) = User::try_from(user_row("USER")) else {
            panic!("decode failed");
        };
        assert!(plain.operator_profile.is_none());
    }

    #[test]
    fn unknown_enum_values_are_decode_errors() {
        assert!(matches!(
            User::try_from(user_row("SUPERUSER")),
            Err(StoreError::Decode(_))
        ));
        assert!(matches!(
            decode::<RequestStatus>("status", "LOST"),
            Err(StoreError::Decode(_))
        ));
    }
}
