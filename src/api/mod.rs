//! REST API layer: caller identity, route handlers, DTOs, router
//! composition and the OpenAPI document.
//!
//! Dashboard endpoints are mounted under `/api/v1`; `/health` sits at the
//! root.

pub mod dto;
pub mod handlers;
pub mod principal;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "Rental dashboard",
        description = "Role-scoped dashboard aggregation for the equipment-rental marketplace."
    ),
    paths(
        handlers::dashboard::get_own_dashboard,
        handlers::dashboard::get_role_dashboard,
        handlers::dashboard::clear_cache,
        handlers::dashboard::set_offline_mode,
        handlers::system::health_handler,
    ),
    tags(
        (name = "Dashboard", description = "Role-shaped dashboards and cache administration"),
        (name = "System", description = "Liveness"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::cache::CacheStore;
    use crate::persistence::InMemoryRecordStore;
    use crate::service::DashboardService;

    fn app() -> Router {
        let service = DashboardService::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(CacheStore::new()),
        );
        build_router().with_state(AppState::new(service))
    }

    async fn status_of(request: Request<Body>) -> StatusCode {
        match app().oneshot(request).await {
            Ok(response) => response.status(),
            Err(never) => match never {},
        }
    }

    #[tokio::test]
    async fn routes_are_mounted() {
        let anonymous = Request::get("/api/v1/dashboard").body(Body::empty());
        let user = Request::get("/api/v1/dashboard")
            .header("x-user-id", "u-1")
            .header("x-user-role", "USER")
            .body(Body::empty());
        let health = Request::get("/health").body(Body::empty());
        let (Ok(anonymous), Ok(user), Ok(health)) = (anonymous, user, health) else {
            return;
        };
        assert_eq!(status_of(anonymous).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(user).await, StatusCode::OK);
        assert_eq!(status_of(health).await, StatusCode::OK);
    }

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/api/v1/dashboard",
            "/api/v1/dashboard/{role}",
            "/api/v1/dashboard/cache",
            "/api/v1/dashboard/offline",
            "/health",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }
}
