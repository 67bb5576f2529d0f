//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::DashboardService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Dashboard service: validation, role plans and caching.
    pub dashboard_service: Arc<DashboardService>,
}

impl AppState {
    /// Wraps a service for sharing across handlers.
    #[must_use]
    pub fn new(dashboard_service: DashboardService) -> Self {
        Self {
            dashboard_service: Arc::new(dashboard_service),
        }
    }
}
