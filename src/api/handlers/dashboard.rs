//! Dashboard handlers: role views, cache invalidation, offline switch.

use std::time::Duration;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::{
    ClearCacheParams, ClearCacheResponse, DashboardParams, DashboardResponse, OfflineModeRequest,
    OfflineModeResponse, ResponseMeta,
};
use crate::api::principal::Principal;
use crate::app_state::AppState;
use crate::cache::CacheKey;
use crate::domain::{CacheOptions, DashboardOptions, UserRole};
use crate::error::{ApiError, ErrorResponse};

/// Paging and caching rules of one role view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewPolicy {
    /// Page size when the caller gives none.
    pub default_limit: u32,
    /// Largest page size accepted.
    pub max_limit: u32,
    /// Server and client cache lifetime.
    pub cache_ttl: Duration,
}

impl ViewPolicy {
    /// Policy for the view of `role`. Wider views refresh more often.
    #[must_use]
    pub const fn for_role(role: UserRole) -> Self {
        let (default_limit, max_limit, ttl_secs) = match role {
            UserRole::User => (10, 50, 300),
            UserRole::Operator => (15, 50, 180),
            UserRole::Manager => (20, 100, 120),
            UserRole::Admin => (25, 100, 60),
        };
        Self {
            default_limit,
            max_limit,
            cache_ttl: Duration::from_secs(ttl_secs),
        }
    }

    /// Resolves the requested page size.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidRequest`] when `limit` is zero or above
    /// the view's maximum.
    pub fn limit(&self, requested: Option<u32>) -> Result<u32, ApiError> {
        match requested {
            None => Ok(self.default_limit),
            Some(n) if (1..=self.max_limit).contains(&n) => Ok(n),
            Some(n) => Err(ApiError::InvalidRequest(format!(
                "limit must be between 1 and {}, got {n}",
                self.max_limit
            ))),
        }
    }

    /// `Cache-Control` value for a response of this view.
    #[must_use]
    pub fn cache_control(&self, caching: bool) -> String {
        if caching {
            format!("private, max-age={}", self.cache_ttl.as_secs())
        } else {
            "no-cache, no-store, must-revalidate".to_string()
        }
    }
}

fn query_params(
    query: Result<Query<DashboardParams>, QueryRejection>,
) -> Result<DashboardParams, ApiError> {
    query
        .map(|Query(p)| p)
        .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))
}

async fn render_view(
    state: &AppState,
    principal: &Principal,
    view: UserRole,
    params: &DashboardParams,
) -> Result<Response, ApiError> {
    principal.require(view)?;

    let policy = ViewPolicy::for_role(view);
    let limit = policy.limit(params.limit)?;
    let offset = params.offset.unwrap_or(0);
    let date_range = params.date_range()?;
    let caching = params.caching_enabled();

    let mut options = DashboardOptions::new(&principal.user_id, view)
        .with_limit(limit)
        .with_offset(offset);
    if let Some(range) = date_range {
        options = options.with_date_range(range);
    }

    let cache = if caching {
        let key = CacheKey::dashboard(&principal.user_id, view)
            .with_page(limit, offset)
            .with_window(date_range);
        CacheOptions::enabled()
            .with_key(key)
            .with_ttl(policy.cache_ttl)
    } else {
        CacheOptions::default()
    };

    let request_id = Uuid::new_v4();
    let fetch = state
        .dashboard_service
        .fetch_dashboard(&options, &cache)
        .await
        .into_result()?;

    tracing::debug!(%request_id, view = %view, cached = fetch.cached, "dashboard served");

    let body = DashboardResponse {
        success: true,
        data: fetch.data,
        meta: ResponseMeta {
            limit,
            offset,
            date_range: date_range.map(Into::into),
            user_role: principal.role,
            cached: fetch.cached,
            request_id,
        },
    };
    Ok((
        [(header::CACHE_CONTROL, policy.cache_control(caching))],
        Json(body),
    )
        .into_response())
}

/// `GET /dashboard`: Dashboard for the caller's own role.
///
/// # Errors
///
/// Returns [`ApiError`] on missing identity, bad parameters or a data
/// failure.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "Dashboard",
    summary = "Get own dashboard",
    description = "Builds the dashboard for the caller's role from the `x-user-id` and `x-user-role` headers.",
    params(DashboardParams),
    responses(
        (status = 200, description = "Role-shaped dashboard", body = DashboardResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 500, description = "Data failure", body = ErrorResponse),
    )
)]
pub async fn get_own_dashboard(
    State(state): State<AppState>,
    principal: Principal,
    query: Result<Query<DashboardParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let params = query_params(query)?;
    render_view(&state, &principal, principal.role, &params).await
}

/// `GET /dashboard/{role}`: A specific role view.
///
/// # Errors
///
/// Returns [`ApiError::Forbidden`] when the caller's role is below the
/// requested view.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/{role}",
    tag = "Dashboard",
    summary = "Get a role view",
    description = "Builds the dashboard of the given role view. The caller's role must be at or above it in USER < OPERATOR < MANAGER < ADMIN.",
    params(
        ("role" = UserRole, Path, description = "View to render, case-insensitive"),
        DashboardParams,
    ),
    responses(
        (status = 200, description = "Role-shaped dashboard", body = DashboardResponse),
        (status = 400, description = "Invalid parameters or unknown role", body = ErrorResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 403, description = "Caller's role is below the view", body = ErrorResponse),
        (status = 500, description = "Data failure", body = ErrorResponse),
    )
)]
pub async fn get_role_dashboard(
    State(state): State<AppState>,
    principal: Principal,
    Path(role): Path<String>,
    query: Result<Query<DashboardParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let view: UserRole = role
        .to_ascii_uppercase()
        .parse()
        .map_err(|_| ApiError::InvalidRequest(format!("unknown role view: {role:?}")))?;
    let params = query_params(query)?;
    render_view(&state, &principal, view, &params).await
}

/// `DELETE /dashboard/cache`: Invalidate cached dashboards.
///
/// # Errors
///
/// Returns [`ApiError::Forbidden`] unless the caller is an admin.
#[utoipa::path(
    delete,
    path = "/api/v1/dashboard/cache",
    tag = "Dashboard",
    summary = "Clear dashboard cache",
    description = "Removes every cached dashboard whose key contains `pattern`, or all of them. Admin only.",
    params(ClearCacheParams),
    responses(
        (status = 200, description = "Entries removed", body = ClearCacheResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
    )
)]
pub async fn clear_cache(
    State(state): State<AppState>,
    principal: Principal,
    Query(params): Query<ClearCacheParams>,
) -> Result<impl IntoResponse, ApiError> {
    principal.require(UserRole::Admin)?;
    let pattern = params.pattern.filter(|p| !p.is_empty());
    let removed = state.dashboard_service.clear_cache(pattern.as_deref());
    Ok(Json(ClearCacheResponse {
        success: true,
        removed,
        pattern,
    }))
}

/// `PUT /dashboard/offline`: Toggle offline mode.
///
/// # Errors
///
/// Returns [`ApiError::Forbidden`] unless the caller is an admin.
#[utoipa::path(
    put,
    path = "/api/v1/dashboard/offline",
    tag = "Dashboard",
    summary = "Set offline mode",
    description = "Switches offline mode on the service and its record store. Admin only.",
    request_body = OfflineModeRequest,
    responses(
        (status = 200, description = "Offline mode applied", body = OfflineModeResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
    )
)]
pub async fn set_offline_mode(
    State(state): State<AppState>,
    principal: Principal,
    Json(req): Json<OfflineModeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    principal.require(UserRole::Admin)?;
    state.dashboard_service.set_offline_mode(req.enabled);
    Ok(Json(OfflineModeResponse {
        success: true,
        enabled: state.dashboard_service.is_offline(),
    }))
}

/// Dashboard routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_own_dashboard))
        .route("/dashboard/cache", delete(clear_cache))
        .route("/dashboard/offline", put(set_offline_mode))
        .route("/dashboard/{role}", get(get_role_dashboard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policies_per_role() {
        let user = ViewPolicy::for_role(UserRole::User);
        assert_eq!((user.default_limit, user.max_limit), (10, 50));
        assert_eq!(user.cache_ttl, Duration::from_secs(300));
        let admin = ViewPolicy::for_role(UserRole::Admin);
        assert_eq!((admin.default_limit, admin.max_limit), (25, 100));
        assert_eq!(admin.cache_ttl, Duration::from_secs(60));
        assert_eq!(ViewPolicy::for_role(UserRole::Operator).default_limit, 15);
        assert_eq!(ViewPolicy::for_role(UserRole::Manager).cache_ttl.as_secs(), 120);
    }

    #[test]
    fn limit_bounds() {
        let op = ViewPolicy::for_role(UserRole::Operator);
        assert!(matches!(op.limit(None), Ok(15)));
        assert!(matches!(op.limit(Some(50)), Ok(50)));
        assert!(matches!(op.limit(Some(51)), Err(ApiError::InvalidRequest(_))));
        assert!(matches!(op.limit(Some(0)), Err(ApiError::InvalidRequest(_))));
        assert!(matches!(
            ViewPolicy::for_role(UserRole::Manager).limit(Some(100)),
            Ok(100)
        ));
    }

    #[test]
    fn cache_control_header() {
        let p = ViewPolicy::for_role(UserRole::Manager);
        assert_eq!(p.cache_control(true), "private, max-age=120");
        assert_eq!(p.cache_control(false), "no-cache, no-store, must-revalidate");
    }
}
