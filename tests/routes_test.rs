//! HTTP-level tests for the assembled router: route guard behavior, login
//! and logout endpoints, and the protected stall/domain CRUD surface.

use std::sync::Arc;

use serde_json::{Value, json};

use stallboard::allowlist::{DomainService, DomainsModule, InMemoryAllowListStore};
use stallboard::auth::{
    AuthModule, InMemoryIdentityProvider, InMemoryTokenStore, SessionChange, SessionManager,
};
use stallboard::dashboard::DashboardModule;
use stallboard::stalls::{InMemoryStallStore, StallService, StallsModule};
use stallboard::testing;
use stallboard::{App, AppContext, ConfigBuilder};

const TENANT: &str = "campus-1";

struct Harness {
    router: axum::Router,
    provider: Arc<InMemoryIdentityProvider>,
    manager: Arc<SessionManager>,
}

fn harness(domains: &[&str]) -> Harness {
    let config = ConfigBuilder::new()
        .with_tenant(TENANT, "Test College")
        .with_initial_domains(domains.iter().map(|d| d.to_string()).collect())
        .build()
        .unwrap();

    let provider = Arc::new(InMemoryIdentityProvider::new());
    provider.add_user("admin@tint.edu.in", "valid-password");
    provider.add_user("intruder@evil-tint.edu.in", "valid-password");

    let allow_list = Arc::new(InMemoryAllowListStore::new().with_tenant(
        TENANT,
        "Test College",
        config.tenant.initial_domains.clone(),
    ));
    let manager = Arc::new(SessionManager::new(
        provider.clone(),
        allow_list.clone(),
        Arc::new(InMemoryTokenStore::new()),
        TENANT,
    ));

    let context = AppContext::builder()
        .with_session(manager.clone())
        .with_domains(Arc::new(DomainService::new(allow_list, TENANT)))
        .with_stalls(Arc::new(StallService::new(
            Arc::new(InMemoryStallStore::new()),
            TENANT,
        )))
        .build();

    let router = App::with_config(config)
        .with_context(context)
        .register_module(AuthModule)
        .register_protected_module(DashboardModule)
        .register_protected_module(StallsModule)
        .register_protected_module(DomainsModule)
        .into_test_router();

    Harness {
        router,
        provider,
        manager,
    }
}

/// Resolve the Initializing state the way startup does: the provider
/// reports no stored session.
async fn settle_unauthenticated(h: &Harness) {
    h.manager.handle_change(SessionChange::Disappeared).await;
}

async fn login_admin(h: &Harness) {
    h.manager
        .login("admin@tint.edu.in", "valid-password")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_health_is_public() {
    let h = harness(&["tint.edu.in"]);
    testing::get(h.router.clone(), "/health")
        .execute()
        .await
        .assert_ok();
}

#[tokio::test]
async fn test_root_redirects_to_dashboard() {
    let h = harness(&["tint.edu.in"]);
    testing::get(h.router.clone(), "/")
        .execute()
        .await
        .assert_redirect_to("/dashboard");
}

#[tokio::test]
async fn test_guard_returns_neutral_wait_while_resolving() {
    let h = harness(&["tint.edu.in"]);

    // No provider notification yet: protected routes neither render nor
    // redirect.
    testing::get(h.router.clone(), "/dashboard")
        .execute()
        .await
        .assert_service_unavailable()
        .assert_header("retry-after", "1");
}

#[tokio::test]
async fn test_guard_redirects_unauthenticated_to_login() {
    let h = harness(&["tint.edu.in"]);
    settle_unauthenticated(&h).await;

    testing::get(h.router.clone(), "/dashboard")
        .execute()
        .await
        .assert_redirect_to("/login");
    testing::get(h.router.clone(), "/stalls")
        .execute()
        .await
        .assert_redirect_to("/login");
    testing::get(h.router.clone(), "/domains")
        .execute()
        .await
        .assert_redirect_to("/login");

    // The login entry point itself is reachable.
    testing::get(h.router.clone(), "/login")
        .execute()
        .await
        .assert_ok();
}

#[tokio::test]
async fn test_login_endpoint_reports_one_message_per_failure() {
    let h = harness(&["tint.edu.in"]);
    settle_unauthenticated(&h).await;

    // Malformed email: rejected locally.
    let body: Value = testing::post(h.router.clone(), "/login")
        .json_body(&json!({"email": "not-an-email", "password": "x"}))
        .execute()
        .await
        .assert_bad_request()
        .json()
        .await;
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("valid email"));

    // Wrong password.
    let body: Value = testing::post(h.router.clone(), "/login")
        .json_body(&json!({"email": "admin@tint.edu.in", "password": "wrong"}))
        .execute()
        .await
        .assert_unauthorized()
        .json()
        .await;
    assert_eq!(body["message"], "Incorrect email or password");

    // Valid credentials, disallowed domain.
    let body: Value = testing::post(h.router.clone(), "/login")
        .json_body(&json!({
            "email": "intruder@evil-tint.edu.in",
            "password": "valid-password"
        }))
        .execute()
        .await
        .assert_unauthorized()
        .json()
        .await;
    assert_eq!(
        body["message"],
        "Access denied: this email domain is not authorized"
    );
    assert!(h.provider.current_session().is_none());
}

#[tokio::test]
async fn test_login_success_unlocks_protected_routes() {
    let h = harness(&["tint.edu.in"]);
    settle_unauthenticated(&h).await;

    let body: Value = testing::post(h.router.clone(), "/login")
        .json_body(&json!({
            "email": "admin@tint.edu.in",
            "password": "valid-password"
        }))
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["state"], "authenticated");
    assert_eq!(body["data"]["is_authorized_admin"], true);

    let body: Value = testing::get(h.router.clone(), "/dashboard")
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert_eq!(body["data"]["tenant_name"], "Test College");
    assert_eq!(body["data"]["allowed_domains"], 1);
}

#[tokio::test]
async fn test_logout_locks_protected_routes_again() {
    let h = harness(&["tint.edu.in"]);
    settle_unauthenticated(&h).await;
    login_admin(&h).await;

    testing::get(h.router.clone(), "/dashboard")
        .execute()
        .await
        .assert_ok();

    testing::post(h.router.clone(), "/logout")
        .execute()
        .await
        .assert_ok();

    testing::get(h.router.clone(), "/dashboard")
        .execute()
        .await
        .assert_redirect_to("/login");
}

#[tokio::test]
async fn test_stall_crud_over_http() {
    let h = harness(&["tint.edu.in"]);
    settle_unauthenticated(&h).await;
    login_admin(&h).await;

    // Create: seeded unverified/active, stamped with the admin's email.
    let body: Value = testing::post(h.router.clone(), "/stalls")
        .json_body(&json!({"name": "Chaat Corner", "email": "owner@food.example"}))
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    let stall_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["is_verified"], false);
    assert_eq!(body["data"]["status"], "active");
    assert_eq!(body["data"]["created_by"], "admin@tint.edu.in");

    // Invalid payloads are rejected.
    testing::post(h.router.clone(), "/stalls")
        .json_body(&json!({"name": "", "email": "owner@food.example"}))
        .execute()
        .await
        .assert_bad_request();
    testing::post(h.router.clone(), "/stalls")
        .json_body(&json!({"name": "ok", "email": "not-an-email"}))
        .execute()
        .await
        .assert_bad_request();

    // List.
    let body: Value = testing::get(h.router.clone(), "/stalls")
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Update.
    let body: Value = testing::put(h.router.clone(), &format!("/stalls/{}", stall_id))
        .json_body(&json!({"status": "inactive"}))
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert_eq!(body["data"]["status"], "inactive");

    // Toggle verification.
    let body: Value = testing::post(h.router.clone(), &format!("/stalls/{}/verify", stall_id))
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert_eq!(body["data"]["is_verified"], true);

    // Delete.
    testing::delete(h.router.clone(), &format!("/stalls/{}", stall_id))
        .execute()
        .await
        .assert_no_content();
    testing::delete(h.router.clone(), &format!("/stalls/{}", stall_id))
        .execute()
        .await
        .assert_not_found();
}

#[tokio::test]
async fn test_domain_management_over_http() {
    let h = harness(&["tint.edu.in"]);
    settle_unauthenticated(&h).await;
    login_admin(&h).await;

    // Removing the only domain is rejected.
    let body: Value = testing::delete(h.router.clone(), "/domains/tint.edu.in")
        .execute()
        .await
        .assert_bad_request()
        .json()
        .await;
    assert!(body["error"].as_str().unwrap().contains("last domain"));

    // Add a second domain.
    let body: Value = testing::post(h.router.clone(), "/domains")
        .json_body(&json!({"domain": "NITK.AC.IN"}))
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    let domains = body["data"]["domains"].as_array().unwrap();
    assert!(domains.contains(&json!("nitk.ac.in")));

    // Duplicates and malformed domains are rejected.
    testing::post(h.router.clone(), "/domains")
        .json_body(&json!({"domain": "nitk.ac.in"}))
        .execute()
        .await
        .assert_bad_request();
    testing::post(h.router.clone(), "/domains")
        .json_body(&json!({"domain": "not a domain"}))
        .execute()
        .await
        .assert_bad_request();

    // With two entries, removal works.
    let body: Value = testing::delete(h.router.clone(), "/domains/nitk.ac.in")
        .execute()
        .await
        .assert_ok()
        .json()
        .await;
    assert_eq!(body["data"]["domains"], json!(["tint.edu.in"]));
}
