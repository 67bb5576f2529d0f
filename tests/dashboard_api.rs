//! End-to-end tests: the REST router over an in-memory record store.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::StatusCode;
use serde_json::Value;

use rental_dashboard::api;
use rental_dashboard::app_state::AppState;
use rental_dashboard::cache::CacheStore;
use rental_dashboard::domain::{
    AssignmentStatus, OperatorAssignment, RequestStatus, ServiceRequest, User, UserRole,
};
use rental_dashboard::persistence::{InMemoryRecordStore, RecordStore};
use rental_dashboard::service::DashboardService;

fn at(day: u32) -> DateTime<Utc> {
    let Some(t) = Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).single() else {
        panic!("valid date");
    };
    t
}

fn request(id: &str, owner: &str, status: RequestStatus, day: u32) -> ServiceRequest {
    ServiceRequest {
        id: id.to_string(),
        title: format!("Job {id}"),
        status,
        owner_user_id: owner.to_string(),
        equipment_category: "CRANES".to_string(),
        job_site: "Harbor".to_string(),
        start_date: at(day) + Duration::days(1),
        end_date: None,
        duration_type: "MULTI_DAY".to_string(),
        duration_value: 2,
        total_hours: Some(16.0),
        estimated_cost: Some(2500.0),
        created_at: at(day),
        updated_at: at(day),
    }
}

fn user(id: &str, role: UserRole) -> User {
    User {
        id: id.to_string(),
        name: Some(id.to_uppercase()),
        email: Some(format!("{id}@example.com")),
        role,
        company: None,
        created_at: at(1),
        operator_profile: None,
    }
}

struct Server {
    base: String,
    store: Arc<InMemoryRecordStore>,
    client: reqwest::Client,
}

impl Server {
    async fn start() -> Self {
        let store = Arc::new(InMemoryRecordStore::new());
        for (id, role) in [
            ("alice", UserRole::User),
            ("olga", UserRole::Operator),
            ("max", UserRole::Manager),
            ("ada", UserRole::Admin),
        ] {
            store.insert_user(user(id, role));
        }
        store.insert_request(request("r1", "alice", RequestStatus::Submitted, 2));
        store.insert_request(request("r2", "alice", RequestStatus::JobInProgress, 3));
        store.insert_request(request("r3", "alice", RequestStatus::PaymentReceived, 4));
        store.insert_request(request("r4", "bob", RequestStatus::Approved, 20));
        store.insert_assignment(OperatorAssignment {
            id: "as1".to_string(),
            service_request_id: "r2".to_string(),
            operator_id: "olga".to_string(),
            status: AssignmentStatus::Active,
            rate: Some(95.0),
            estimated_hours: Some(16.0),
            actual_hours: None,
            assigned_at: at(3),
            accepted_at: Some(at(3)),
            completed_at: None,
        });

        let dyn_store: Arc<dyn RecordStore> = Arc::clone(&store) as Arc<dyn RecordStore>;
        let service = DashboardService::new(dyn_store, Arc::new(CacheStore::new()));
        let app = api::build_router().with_state(AppState::new(service));

        let Ok(listener) = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await
        else {
            panic!("bind ephemeral port");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("local addr");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base: format!("http://{addr}"),
            store,
            client: reqwest::Client::new(),
        }
    }

    async fn call(
        &self,
        method: reqwest::Method,
        path: &str,
        who: Option<(&str, &str)>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut req = self.client.request(method, format!("{}{path}", self.base));
        if let Some((id, role)) = who {
            req = req.header("x-user-id", id).header("x-user-role", role);
        }
        let Ok(response) = req.send().await else {
            panic!("request to {path} failed");
        };
        let status = response.status();
        let cache_control = response
            .headers()
            .get("cache-control")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        (status, cache_control, body)
    }

    async fn get(&self, path: &str, who: Option<(&str, &str)>) -> (StatusCode, Option<String>, Value) {
        self.call(reqwest::Method::GET, path, who).await
    }
}

#[tokio::test]
async fn health_is_open() {
    let server = Server::start().await;
    let (status, _, body) = server.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn missing_identity_is_unauthorized() {
    let server = Server::start().await;
    let (status, _, body) = server.get("/api/v1/dashboard", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _, _) = server
        .get("/api/v1/dashboard", Some(("alice", "SUPERUSER")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn own_dashboard_with_meta_and_headers() {
    let server = Server::start().await;
    let (status, cache_control, body) =
        server.get("/api/v1/dashboard", Some(("alice", "USER"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache_control.as_deref(), Some("private, max-age=300"));
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["stats"]["totalRequests"], 3);
    assert_eq!(body["data"]["stats"]["pendingApproval"], 1);
    assert!(body["data"].get("users").is_none());
    assert_eq!(body["meta"]["limit"], 10);
    assert_eq!(body["meta"]["offset"], 0);
    assert_eq!(body["meta"]["userRole"], "USER");
    assert_eq!(body["meta"]["cached"], false);
    assert!(body["meta"]["dateRange"].is_null());
    assert!(body["meta"]["requestId"].is_string());

    let (_, _, again) = server.get("/api/v1/dashboard", Some(("alice", "USER"))).await;
    assert_eq!(again["meta"]["cached"], true);
}

#[tokio::test]
async fn caching_can_be_bypassed() {
    let server = Server::start().await;
    let path = "/api/v1/dashboard?enableCaching=false";
    let (_, cache_control, _) = server.get(path, Some(("alice", "USER"))).await;
    assert_eq!(
        cache_control.as_deref(),
        Some("no-cache, no-store, must-revalidate")
    );
    let before = server.store.query_count();
    let (_, _, body) = server.get(path, Some(("alice", "USER"))).await;
    assert_eq!(body["meta"]["cached"], false);
    assert!(server.store.query_count() > before);
}

#[tokio::test]
async fn role_view_follows_hierarchy() {
    let server = Server::start().await;
    let (status, _, body) = server
        .get("/api/v1/dashboard/admin", Some(("max", "MANAGER")))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, cache_control, body) = server
        .get("/api/v1/dashboard/OPERATOR", Some(("max", "MANAGER")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache_control.as_deref(), Some("private, max-age=180"));
    assert_eq!(body["meta"]["limit"], 15);
    assert_eq!(body["meta"]["userRole"], "MANAGER");

    let (status, _, _) = server
        .get("/api/v1/dashboard/janitor", Some(("ada", "ADMIN")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn manager_window_and_limits() {
    let server = Server::start().await;
    let (status, _, body) = server
        .get(
            "/api/v1/dashboard?startDate=2024-03-01&endDate=2024-03-10&limit=100",
            Some(("max", "MANAGER")),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stats"]["totalRequests"], 3);
    assert_eq!(body["data"]["stats"]["revenue"], 2500.0);
    assert_eq!(body["meta"]["dateRange"]["startDate"], "2024-03-01T00:00:00Z");
    assert_eq!(body["data"]["assignments"].as_array().map(Vec::len), Some(1));

    let (status, _, body) = server
        .get("/api/v1/dashboard?limit=51", Some(("olga", "OPERATOR")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");

    let (status, _, _) = server
        .get("/api/v1/dashboard?limit=lots", Some(("olga", "OPERATOR")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_failure_is_opaque() {
    let server = Server::start().await;
    server.store.fail_with("relation \"service_requests\" does not exist");
    let (status, _, body) = server
        .get("/api/v1/dashboard?enable_caching=0", Some(("alice", "USER")))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "DASHBOARD_DATA_ERROR");
    assert_eq!(body["error"]["message"], "Failed to fetch dashboard data");
}

#[tokio::test]
async fn admin_cache_and_offline_controls() {
    let server = Server::start().await;
    server.get("/api/v1/dashboard", Some(("alice", "USER"))).await;
    server.get("/api/v1/dashboard", Some(("ada", "ADMIN"))).await;

    let (status, _, _) = server
        .call(reqwest::Method::DELETE, "/api/v1/dashboard/cache", Some(("max", "MANAGER")))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = server
        .call(
            reqwest::Method::DELETE,
            "/api/v1/dashboard/cache?pattern=dashboard_alice_",
            Some(("ada", "ADMIN")),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 1);

    let (_, _, body) = server
        .call(reqwest::Method::DELETE, "/api/v1/dashboard/cache", Some(("ada", "ADMIN")))
        .await;
    assert_eq!(body["removed"], 1);

    let Ok(response) = server
        .client
        .put(format!("{}/api/v1/dashboard/offline", server.base))
        .header("x-user-id", "ada")
        .header("x-user-role", "ADMIN")
        .json(&serde_json::json!({ "enabled": true }))
        .send()
        .await
    else {
        panic!("offline request failed");
    };
    assert_eq!(response.status(), StatusCode::OK);
    assert!(server.store.is_offline());
}
