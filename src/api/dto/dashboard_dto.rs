//! Dashboard DTOs: query parameters, response envelope and admin bodies.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{DashboardResult, DateRange, UserRole};
use crate::error::ApiError;

/// Query string of the dashboard endpoints.
///
/// Both snake_case and camelCase names are accepted.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardParams {
    /// Page size; per-role default and maximum apply.
    pub limit: Option<u32>,
    /// Rows to skip in paged lists.
    pub offset: Option<u32>,
    /// Window start, RFC 3339 or `YYYY-MM-DD`. Ignored without `end_date`.
    #[serde(alias = "startDate")]
    pub start_date: Option<String>,
    /// Window end, RFC 3339 or `YYYY-MM-DD`. Ignored without `start_date`.
    #[serde(alias = "endDate")]
    pub end_date: Option<String>,
    /// `false` or `0` bypasses the server cache; anything else enables it.
    #[serde(alias = "enableCaching")]
    pub enable_caching: Option<String>,
}

fn parse_instant(name: &str, raw: &str) -> Result<DateTime<Utc>, ApiError> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
        .ok_or_else(|| ApiError::InvalidRequest(format!("{name} is not a valid date: {raw:?}")))
}

impl DashboardParams {
    /// Whether the server cache should be used.
    #[must_use]
    pub fn caching_enabled(&self) -> bool {
        !matches!(self.enable_caching.as_deref().map(str::trim), Some("false" | "0"))
    }

    /// The requested window, when both ends are supplied.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] when either end is not a date
    /// or the start is after the end.
    pub fn date_range(&self) -> Result<Option<DateRange>, ApiError> {
        let (Some(start), Some(end)) = (&self.start_date, &self.end_date) else {
            return Ok(None);
        };
        let start = parse_instant("start_date", start)?;
        let end = parse_instant("end_date", end)?;
        if start > end {
            return Err(ApiError::InvalidRequest(
                "start_date must not be after end_date".to_string(),
            ));
        }
        Ok(Some(DateRange::new(start, end)))
    }
}

/// Window echoed in [`ResponseMeta`].
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeMeta {
    /// Window start.
    pub start_date: DateTime<Utc>,
    /// Window end.
    pub end_date: DateTime<Utc>,
}

impl From<DateRange> for DateRangeMeta {
    fn from(r: DateRange) -> Self {
        Self {
            start_date: r.start,
            end_date: r.end,
        }
    }
}

/// Request metadata returned alongside a dashboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    /// Effective page size.
    pub limit: u32,
    /// Effective offset.
    pub offset: u32,
    /// Effective window, `null` when none.
    pub date_range: Option<DateRangeMeta>,
    /// Caller's role.
    pub user_role: UserRole,
    /// `true` when served from the server cache.
    pub cached: bool,
    /// Correlation id for logs.
    pub request_id: Uuid,
}

/// Body of a successful dashboard response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardResponse {
    /// Always `true`.
    pub success: bool,
    /// The role-shaped dashboard.
    pub data: DashboardResult,
    /// Request metadata.
    pub meta: ResponseMeta,
}

/// Query string of `DELETE /dashboard/cache`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClearCacheParams {
    /// Literal substring; every key containing it is removed. Omit to
    /// flush everything.
    pub pattern: Option<String>,
}

/// Body of `DELETE /dashboard/cache`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClearCacheResponse {
    /// Always `true`.
    pub success: bool,
    /// Entries removed.
    pub removed: usize,
    /// Pattern applied, if any.
    pub pattern: Option<String>,
}

/// Body of `PUT /dashboard/offline`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct OfflineModeRequest {
    /// New offline-mode value.
    pub enabled: bool,
}

/// Response of `PUT /dashboard/offline`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OfflineModeResponse {
    /// Always `true`.
    pub success: bool,
    /// Offline-mode value now in effect.
    pub enabled: bool,
}
