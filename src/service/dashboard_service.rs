//! Dashboard service: validation, role dispatch and read-through caching.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::assembler;
use crate::cache::{CacheKey, CacheStore};
use crate::domain::options::DEFAULT_CACHE_TTL;
use crate::domain::{CacheOptions, DashboardOptions, DashboardResult, UserRole};
use crate::envelope::ServiceResult;
use crate::error::{DashboardError, ServiceError};
use crate::persistence::RecordStore;

/// A dashboard plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardFetch {
    /// The assembled dashboard.
    pub data: DashboardResult,
    /// `true` when served from the cache without touching the store.
    pub cached: bool,
    /// Key the result was read from or written to, when caching was on.
    pub cache_key: Option<String>,
}

/// Shortens a user id for logs: first two characters, then a mask.
fn redact(user_id: &str) -> String {
    let head: String = user_id.chars().take(2).collect();
    format!("{head}***")
}

/// Entry point for dashboard reads.
///
/// Stateless apart from the shared [`CacheStore`] and the offline flag.
/// Every public method returns normally: failures are carried in a
/// [`ServiceResult`], never raised.
#[derive(Debug)]
pub struct DashboardService {
    store: Arc<dyn RecordStore>,
    cache: Arc<CacheStore<DashboardResult>>,
    offline: AtomicBool,
    default_ttl: Duration,
}

impl DashboardService {
    /// Creates a service over `store`, sharing `cache`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, cache: Arc<CacheStore<DashboardResult>>) -> Self {
        Self {
            store,
            cache,
            offline: AtomicBool::new(false),
            default_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Overrides the TTL used when a call enables caching without one.
    #[must_use]
    pub const fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Returns a reference to the shared cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<CacheStore<DashboardResult>> {
        &self.cache
    }

    /// Builds the dashboard for `options`.
    ///
    /// Validation runs first and fails without touching cache or store.
    /// With caching enabled a live entry is returned as-is; otherwise the
    /// role plan runs and its result is cached for the requested TTL.
    pub async fn get_dashboard_data(
        &self,
        options: &DashboardOptions,
        cache: &CacheOptions,
    ) -> ServiceResult<DashboardResult> {
        self.fetch_dashboard(options, cache).await.map(|f| f.data)
    }

    /// Like [`DashboardService::get_dashboard_data`], but also reports
    /// whether the result came from the cache.
    pub async fn fetch_dashboard(
        &self,
        options: &DashboardOptions,
        cache: &CacheOptions,
    ) -> ServiceResult<DashboardFetch> {
        self.try_fetch(options, cache)
            .await
            .map_err(|err| {
                if let DashboardError::Store(cause) = &err {
                    tracing::error!(
                        user = %redact(&options.user_id),
                        role = %options.user_role,
                        error = %cause,
                        "dashboard assembly failed"
                    );
                } else {
                    tracing::debug!(error = %err, "dashboard request rejected");
                }
                ServiceError::from(err)
            })
            .into()
    }

    async fn try_fetch(
        &self,
        options: &DashboardOptions,
        cache: &CacheOptions,
    ) -> Result<DashboardFetch, DashboardError> {
        let query = options.validate()?;

        let key = cache.enable_caching.then(|| {
            cache
                .cache_key
                .clone()
                .unwrap_or_else(|| CacheKey::dashboard(&query.user_id, query.role).into())
        });

        if let Some(key) = &key
            && let Some(data) = self.cache.get(key)
        {
            tracing::debug!(user = %redact(&query.user_id), role = %query.role, "dashboard cache hit");
            return Ok(DashboardFetch {
                data,
                cached: true,
                cache_key: Some(key.clone()),
            });
        }

        let data = assembler::assemble(self.store.as_ref(), &query).await?;

        if let Some(key) = &key {
            let ttl = cache.cache_ttl.unwrap_or(self.default_ttl);
            self.cache.set(key.clone(), data.clone(), ttl);
        }

        tracing::info!(
            user = %redact(&query.user_id),
            role = %query.role,
            recent = data.recent_requests.len(),
            "dashboard assembled"
        );
        Ok(DashboardFetch {
            data,
            cached: false,
            cache_key: key,
        })
    }

    /// Switches offline mode and forwards it to the record store. Never
    /// fails.
    pub fn set_offline_mode(&self, enabled: bool) {
        let previous = self.offline.swap(enabled, Ordering::Relaxed);
        self.store.set_offline_mode(enabled);
        if previous != enabled {
            tracing::info!(enabled, "offline mode changed");
        }
    }

    /// Current offline-mode flag.
    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Relaxed)
    }

    /// Removes cached dashboards whose key contains `pattern`, or all of
    /// them. Returns how many were removed.
    pub fn clear_cache(&self, pattern: Option<&str>) -> usize {
        let removed = self.cache.clear(pattern);
        tracing::info!(removed, pattern = pattern.unwrap_or("*"), "dashboard cache cleared");
        removed
    }

    /// Reads a cached dashboard by raw key.
    pub fn get_from_cache(&self, key: &str) -> Option<DashboardResult> {
        self.cache.get(key)
    }

    /// Writes a dashboard under a raw key.
    pub fn set_cache(&self, key: impl Into<String>, value: DashboardResult, ttl: Duration) {
        self.cache.set(key, value, ttl);
    }

    /// Reads the dashboard cached under the standard key for a principal.
    pub fn get_cached_dashboard_data(
        &self,
        user_id: &str,
        role: UserRole,
    ) -> Option<DashboardResult> {
        self.cache.get(&CacheKey::dashboard(user_id, role).to_string())
    }
}
