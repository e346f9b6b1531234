//! Integration tests for the domain-gated login flow.
//!
//! These drive the session manager end-to-end against the in-memory
//! identity provider, allow-list store, and token store, including the
//! startup-rehydration path through the provider's event stream.

use std::sync::Arc;
use std::time::Duration;

use stallboard::allowlist::{AllowListStore, DomainService, InMemoryAllowListStore};
use stallboard::auth::{
    ADMIN_TOKEN_KEY, AuthError, IdentityProvider, InMemoryIdentityProvider, InMemoryTokenStore,
    Session, SessionHandle, SessionManager, SessionState, TokenStore,
};

const TENANT: &str = "campus-1";

struct Harness {
    provider: Arc<InMemoryIdentityProvider>,
    allow_list: Arc<InMemoryAllowListStore>,
    tokens: Arc<InMemoryTokenStore>,
    manager: Arc<SessionManager>,
}

fn harness(domains: &[&str]) -> Harness {
    let provider = Arc::new(InMemoryIdentityProvider::new());
    provider.add_user("a@tint.edu.in", "valid-password");
    provider.add_user("a@evil-tint.edu.in", "valid-password");

    let allow_list = Arc::new(InMemoryAllowListStore::new().with_tenant(
        TENANT,
        "Test College",
        domains.iter().map(|d| d.to_string()).collect(),
    ));
    let tokens = Arc::new(InMemoryTokenStore::new());
    let manager = Arc::new(SessionManager::new(
        provider.clone(),
        allow_list.clone(),
        tokens.clone(),
        TENANT,
    ));

    Harness {
        provider,
        allow_list,
        tokens,
        manager,
    }
}

async fn wait_for(handle: &mut SessionHandle, pred: impl Fn(&Session) -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if pred(&handle.current()) {
                return;
            }
            if !handle.changed().await {
                panic!("session manager dropped while waiting");
            }
        }
    })
    .await
    .expect("timed out waiting for session state");
}

#[tokio::test]
async fn test_full_login_scenario() {
    let h = harness(&["tint.edu.in"]);

    // Allowed domain signs in.
    let session = h
        .manager
        .login("a@tint.edu.in", "valid-password")
        .await
        .unwrap();
    assert_eq!(session.state, SessionState::Authenticated);
    assert!(session.is_authorized_admin);
    assert!(h.tokens.get(ADMIN_TOKEN_KEY).await.unwrap().is_some());

    // A lookalike domain that merely ends with the allowed entry is denied.
    let err = h
        .manager
        .login("a@evil-tint.edu.in", "valid-password")
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::DomainNotAllowed);
    assert_eq!(h.manager.current().state, SessionState::Unauthenticated);
    assert!(h.provider.current_session().is_none());
    assert!(h.tokens.get(ADMIN_TOKEN_KEY).await.unwrap().is_none());

    // Removing the only remaining domain is rejected and the list unchanged.
    let domains = DomainService::new(h.allow_list.clone(), TENANT);
    let err = domains.remove("tint.edu.in").await.unwrap_err();
    assert!(err.to_string().contains("last domain"));
    assert_eq!(domains.list().await.unwrap().domains, vec!["tint.edu.in"]);
}

#[tokio::test]
async fn test_startup_rehydration_with_allowed_domain() {
    let h = harness(&["tint.edu.in"]);

    // A stored provider session exists before the app subscribes.
    h.provider.restore_session("a@tint.edu.in");

    let mut handle = h.manager.handle();
    assert_eq!(handle.current().state, SessionState::Initializing);

    let listener = h.manager.spawn_listener();

    wait_for(&mut handle, |s| s.state == SessionState::Authenticated).await;
    let session = handle.current();
    assert!(session.is_authorized_admin);
    assert_eq!(session.email.as_deref(), Some("a@tint.edu.in"));
    assert!(h.tokens.get(ADMIN_TOKEN_KEY).await.unwrap().is_some());

    listener.abort();
}

#[tokio::test]
async fn test_startup_rehydration_without_stored_session() {
    let h = harness(&["tint.edu.in"]);

    let mut handle = h.manager.handle();
    let listener = h.manager.spawn_listener();

    // The provider replays "no session" and Initializing resolves.
    wait_for(&mut handle, |s| s.state == SessionState::Unauthenticated).await;
    assert!(!handle.current().is_loading);

    listener.abort();
}

#[tokio::test]
async fn test_rehydration_rechecks_against_current_allow_list() {
    let h = harness(&["tint.edu.in"]);

    h.manager
        .login("a@tint.edu.in", "valid-password")
        .await
        .unwrap();

    // The domain is removed from the allow-list after login.
    h.allow_list
        .remove_domain(TENANT, "tint.edu.in")
        .await
        .unwrap();
    h.allow_list
        .add_domain(TENANT, "nitk.ac.in")
        .await
        .unwrap();

    let mut handle = h.manager.handle();
    let listener = h.manager.spawn_listener();

    // The provider still has a stored session for the now-disallowed
    // domain; the re-check signs it out.
    h.provider.restore_session("a@tint.edu.in");

    wait_for(&mut handle, |s| {
        s.state == SessionState::Unauthenticated && !s.is_authorized_admin
    })
    .await;

    // The forced provider sign-out and token removal land as the listener
    // drains the queued events.
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let token = h.tokens.get(ADMIN_TOKEN_KEY).await.unwrap();
            if h.provider.current_session().is_none() && token.is_none() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("provider session was not invalidated");

    listener.abort();
}

#[tokio::test]
async fn test_provider_sign_out_elsewhere_clears_session() {
    let h = harness(&["tint.edu.in"]);

    let mut handle = h.manager.handle();
    let listener = h.manager.spawn_listener();
    wait_for(&mut handle, |s| s.state == SessionState::Unauthenticated).await;

    let session = h
        .manager
        .login("a@tint.edu.in", "valid-password")
        .await
        .unwrap();
    wait_for(&mut handle, |s| s.state == SessionState::Authenticated).await;

    // The provider session is invalidated out-of-band (another device).
    let identity = session.identity.expect("authenticated session has identity");
    h.provider.invalidate_session(&identity).await.unwrap();

    wait_for(&mut handle, |s| s.state == SessionState::Unauthenticated).await;
    assert!(h.tokens.get(ADMIN_TOKEN_KEY).await.unwrap().is_none());

    listener.abort();
}

#[tokio::test]
async fn test_logout_clears_everything_despite_provider_failure() {
    let h = harness(&["tint.edu.in"]);

    h.manager
        .login("a@tint.edu.in", "valid-password")
        .await
        .unwrap();
    assert!(h.tokens.get(ADMIN_TOKEN_KEY).await.unwrap().is_some());

    h.provider.fail_invalidation(true);
    h.manager.logout().await;

    let session = h.manager.current();
    assert_eq!(session.state, SessionState::Unauthenticated);
    assert!(session.identity.is_none());
    assert!(!session.is_authorized_admin);
    assert!(h.tokens.get(ADMIN_TOKEN_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn test_malformed_email_short_circuits() {
    let h = harness(&["tint.edu.in"]);

    for bad in ["plain", "missing-domain@", "@missing-local.edu", "a@nodot"] {
        let err = h.manager.login(bad, "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)), "case {:?}", bad);
    }

    // The provider was never contacted.
    assert_eq!(h.provider.verify_calls(), 0);
}
