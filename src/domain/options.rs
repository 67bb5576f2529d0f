//! Dashboard call options and their validation.
//!
//! [`DashboardOptions`] is what a caller hands in: the role is still the
//! raw string taken from the caller's credentials. [`DashboardOptions::validate`]
//! turns it into a [`DashboardQuery`] with a typed [`UserRole`], which is the
//! only form the assemblers accept.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::role::UserRole;
use crate::error::DashboardError;

/// Default page size for recent requests and assignments.
pub const DEFAULT_LIMIT: u32 = 10;

/// Largest page size a caller may ask for.
pub const MAX_LIMIT: u32 = 100;

/// Default lifetime of a cached dashboard.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Inclusive `created_at` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct DateRange {
    /// Window start (inclusive).
    pub start: DateTime<Utc>,
    /// Window end (inclusive).
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Creates a window.
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// Unvalidated input to
/// [`DashboardService::get_dashboard_data`](crate::service::DashboardService::get_dashboard_data).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardOptions {
    /// Principal the dashboard is built for.
    pub user_id: String,
    /// Raw role name, e.g. `"MANAGER"`.
    pub user_role: String,
    /// Page size; [`DEFAULT_LIMIT`] when `None`.
    pub limit: Option<u32>,
    /// Page offset; 0 when `None`.
    pub offset: Option<u32>,
    /// Optional `created_at` window (MANAGER and ADMIN only).
    pub date_range: Option<DateRange>,
}

impl DashboardOptions {
    /// Options for `user_id` acting as `role`, with default paging.
    pub fn new(user_id: impl Into<String>, role: impl ToString) -> Self {
        Self {
            user_id: user_id.into(),
            user_role: role.to_string(),
            limit: None,
            offset: None,
            date_range: None,
        }
    }

    /// Sets the page size.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the page offset.
    #[must_use]
    pub const fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Sets the `created_at` window.
    #[must_use]
    pub const fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Checks the options and resolves the role.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Validation`] when the user id is blank, the
    /// role is not one of the four known roles, the limit is outside
    /// `1..=MAX_LIMIT`, or the date range is inverted.
    pub fn validate(&self) -> Result<DashboardQuery, DashboardError> {
        let user_id = self.user_id.trim();
        if user_id.is_empty() {
            return Err(DashboardError::missing(
                "Missing required parameters",
                &["userId"],
            ));
        }
        if self.user_role.trim().is_empty() {
            return Err(DashboardError::missing(
                "Missing required parameters",
                &["userRole"],
            ));
        }

        let role: UserRole = self
            .user_role
            .parse()
            .map_err(|_| DashboardError::validation("Unrecognized user role", &["userRole"]))?;

        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 || limit > MAX_LIMIT {
            return Err(DashboardError::validation(
                format!("limit must be between 1 and {MAX_LIMIT}"),
                &["limit"],
            ));
        }

        if let Some(range) = self.date_range
            && range.start > range.end
        {
            return Err(DashboardError::validation(
                "dateRange start must not be after end",
                &["dateRange"],
            ));
        }

        Ok(DashboardQuery {
            user_id: user_id.to_string(),
            role,
            limit,
            offset: self.offset.unwrap_or(0),
            date_range: self.date_range,
        })
    }
}

/// Validated, role-resolved dashboard request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardQuery {
    /// Principal id, trimmed and non-empty.
    pub user_id: String,
    /// Resolved role.
    pub role: UserRole,
    /// Page size in `1..=MAX_LIMIT`.
    pub limit: u32,
    /// Page offset.
    pub offset: u32,
    /// Optional window.
    pub date_range: Option<DateRange>,
}

/// Caching behaviour for one dashboard call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheOptions {
    /// Read through and write back to the cache.
    pub enable_caching: bool,
    /// Explicit key; the standard `dashboard_{user}_{ROLE}` key when `None`.
    pub cache_key: Option<String>,
    /// Entry lifetime; the service default when `None`.
    pub cache_ttl: Option<Duration>,
}

impl CacheOptions {
    /// Caching on, standard key, default TTL.
    #[must_use]
    pub fn enabled() -> Self {
        Self {
            enable_caching: true,
            ..Self::default()
        }
    }

    /// Uses an explicit cache key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    /// Uses an explicit TTL.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn defaults_applied() {
        let Ok(q) = DashboardOptions::new("u1", UserRole::User).validate() else {
            panic!("valid options");
        };
        assert_eq!(q.limit, DEFAULT_LIMIT);
        assert_eq!(q.offset, 0);
        assert_eq!(q.role, UserRole::User);
        assert!(q.date_range.is_none());
    }

    #[test]
    fn blank_user_id_rejected() {
        for id in ["", "   ", "\t"] {
            let err = DashboardOptions::new(id, "USER").validate();
            assert!(matches!(err, Err(DashboardError::Validation { .. })));
        }
    }

    #[test]
    fn unknown_role_rejected() {
        let err = DashboardOptions::new("u1", "ROOT").validate();
        let Err(DashboardError::Validation { fields, .. }) = err else {
            panic!("expected validation error");
        };
        assert_eq!(fields, vec!["userRole"]);
    }

    #[test]
    fn absent_and_malformed_are_told_apart() {
        let Err(DashboardError::Validation { missing, .. }) =
            DashboardOptions::new("  ", "USER").validate()
        else {
            panic!("expected validation error");
        };
        assert!(missing);
        let Err(DashboardError::Validation { fields, missing, .. }) =
            DashboardOptions::new("u1", "").validate()
        else {
            panic!("expected validation error");
        };
        assert!(missing);
        assert_eq!(fields, vec!["userRole"]);
        let Err(DashboardError::Validation { missing, .. }) =
            DashboardOptions::new("u1", "USER").with_limit(0).validate()
        else {
            panic!("expected validation error");
        };
        assert!(!missing);
    }

    #[test]
    fn limit_bounds() {
        assert!(DashboardOptions::new("u1", "USER").with_limit(0).validate().is_err());
        assert!(
            DashboardOptions::new("u1", "USER")
                .with_limit(MAX_LIMIT + 1)
                .validate()
                .is_err()
        );
        assert!(
            DashboardOptions::new("u1", "USER")
                .with_limit(MAX_LIMIT)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn inverted_range_rejected() {
        let a = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).single();
        let b = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single();
        let (Some(a), Some(b)) = (a, b) else {
            panic!("valid dates");
        };
        let opts = DashboardOptions::new("m1", "MANAGER").with_date_range(DateRange::new(a, b));
        assert!(opts.validate().is_err());
        let opts = DashboardOptions::new("m1", "MANAGER").with_date_range(DateRange::new(b, a));
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn user_id_is_trimmed() {
        let Ok(q) = DashboardOptions::new("  u1 ", "ADMIN").validate() else {
            panic!("valid options");
        };
        assert_eq!(q.user_id, "u1");
    }
}
