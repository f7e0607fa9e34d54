//! Mock API tests for the session manager.
//!
//! These tests use wiremock to simulate the platform API and exercise the
//! session state machine without network access or real credentials.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use modelwatch_core::{
    AccessToken, ApiUrl, Credentials, Error, MemoryTokenStore, SessionStatus, TokenStore,
    UnauthorizedPolicy,
};
use modelwatch_rest::{RegistrationData, SessionManager};

/// Helper to create an API URL from a mock server.
fn mock_api_url(server: &MockServer) -> ApiUrl {
    // For tests, HTTP localhost is allowed
    ApiUrl::new(format!("http://127.0.0.1:{}", server.address().port())).unwrap()
}

/// Identity body in the shape the platform API returns.
fn identity_body(email: &str, username: &str) -> serde_json::Value {
    json!({
        "id": "3f6c2a4e-9d0b-4c7a-8f21-0b5e6a7d8c90",
        "email": email,
        "username": username,
        "full_name": null,
        "role": "data_scientist",
        "subscription_tier": "starter",
        "subscription_status": "active",
        "is_active": true,
        "is_verified": false,
        "preferences": {},
        "created_at": "2024-01-15T10:30:00Z",
        "updated_at": null,
        "last_login": null
    })
}

/// Session manager over a shared in-memory store, so tests can inspect
/// persistence directly.
fn session_with_store(server: &MockServer) -> (SessionManager, Arc<MemoryTokenStore>) {
    let store = Arc::new(MemoryTokenStore::new());
    let session = SessionManager::new(mock_api_url(server), Arc::clone(&store));
    (session, store)
}

/// Policy that counts forced logouts.
#[derive(Default)]
struct CountingPolicy(AtomicUsize);

impl UnauthorizedPolicy for CountingPolicy {
    fn on_unauthorized(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn login_success_persists_token_and_identity() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login/email"))
        .and(body_json(json!({
            "email": "a@b.com",
            "password": "secret"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "token_type": "bearer",
            "user": identity_body("a@b.com", "ab")
        })))
        .mount(&server)
        .await;

    let (session, store) = session_with_store(&server);
    session.initialize().await;

    let identity = session
        .login(Credentials::new("a@b.com", "secret"))
        .await
        .unwrap();

    assert_eq!(identity.email, "a@b.com");
    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_eq!(session.token().unwrap(), "T1");
    assert_eq!(store.load().unwrap().unwrap(), "T1");
    assert_eq!(session.identity().unwrap().username, "ab");
}

#[tokio::test]
async fn login_failure_reverts_to_anonymous_and_clears_store() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login/email"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Incorrect email or password"
        })))
        .mount(&server)
        .await;

    let (session, store) = session_with_store(&server);
    // A leftover credential must not survive a failed login
    store.save(&AccessToken::new("stale")).unwrap();

    let result = session.login(Credentials::new("bad@user.com", "wrong")).await;

    match result {
        Err(Error::Authentication(err)) => {
            assert_eq!(err.message(), "Incorrect email or password");
            assert!(!err.is_superseded());
        }
        other => panic!("expected authentication error, got {:?}", other),
    }
    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert!(session.token().is_none());
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn login_failure_surfaces_server_error_detail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login/email"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "detail": "database unavailable"
        })))
        .mount(&server)
        .await;

    let (session, store) = session_with_store(&server);
    let result = session.login(Credentials::new("a@b.com", "secret")).await;

    match result {
        Err(Error::Authentication(err)) => assert_eq!(err.message(), "database unavailable"),
        other => panic!("expected authentication error, got {:?}", other),
    }
    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn overlapping_logins_apply_only_the_last_issued() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login/email"))
        .and(body_json(json!({
            "email": "slow@example.com",
            "password": "pw"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(300))
                .set_body_json(json!({
                    "access_token": "T-SLOW",
                    "token_type": "bearer",
                    "user": identity_body("slow@example.com", "slow")
                })),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login/email"))
        .and(body_json(json!({
            "email": "fast@example.com",
            "password": "pw"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T-FAST",
            "token_type": "bearer",
            "user": identity_body("fast@example.com", "fast")
        })))
        .mount(&server)
        .await;

    let (session, store) = session_with_store(&server);
    session.initialize().await;

    // First attempt resolves late; second attempt is issued before that
    let slow = {
        let session = session.clone();
        tokio::spawn(
            async move { session.login(Credentials::new("slow@example.com", "pw")).await },
        )
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let fast = session
        .login(Credentials::new("fast@example.com", "pw"))
        .await
        .unwrap();
    assert_eq!(fast.email, "fast@example.com");

    match slow.await.unwrap() {
        Err(Error::Authentication(err)) => assert!(err.is_superseded()),
        other => panic!("expected superseded login, got {:?}", other),
    }

    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_eq!(session.token().unwrap(), "T-FAST");
    assert_eq!(store.load().unwrap().unwrap(), "T-FAST");
    assert_eq!(session.identity().unwrap().email, "fast@example.com");
}

#[tokio::test]
async fn logout_during_login_discards_the_login_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login/email"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(300))
                .set_body_json(json!({
                    "access_token": "T-LATE",
                    "token_type": "bearer",
                    "user": identity_body("late@example.com", "late")
                })),
        )
        .mount(&server)
        .await;

    let (session, store) = session_with_store(&server);
    session.initialize().await;

    let login = {
        let session = session.clone();
        tokio::spawn(
            async move { session.login(Credentials::new("late@example.com", "pw")).await },
        )
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    session.logout().await;

    match login.await.unwrap() {
        Err(Error::Authentication(err)) => assert!(err.is_superseded()),
        other => panic!("expected superseded login, got {:?}", other),
    }
    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert!(store.load().unwrap().is_none());
}

// ============================================================================
// Initialization
// ============================================================================

#[tokio::test]
async fn initialize_restores_persisted_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .and(header("authorization", "Bearer T0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(identity_body("alice@example.com", "alice")),
        )
        .mount(&server)
        .await;

    let (session, store) = session_with_store(&server);
    store.save(&AccessToken::new("T0")).unwrap();

    let status = session.initialize().await;

    assert_eq!(status, SessionStatus::Authenticated);
    assert_eq!(session.token().unwrap(), "T0");
    assert_eq!(session.identity().unwrap().username, "alice");
}

#[tokio::test]
async fn initialize_discards_rejected_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Could not validate credentials"
        })))
        .mount(&server)
        .await;

    let (session, store) = session_with_store(&server);
    store.save(&AccessToken::new("expired")).unwrap();

    let status = session.initialize().await;

    assert_eq!(status, SessionStatus::Anonymous);
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn initialize_without_token_makes_no_request() {
    let server = MockServer::start().await;
    let (session, _store) = session_with_store(&server);

    let status = session.initialize().await;

    assert_eq!(status, SessionStatus::Anonymous);
    assert!(!session.is_loading());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn initialize_runs_at_most_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login/email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "token_type": "bearer",
            "user": identity_body("a@b.com", "ab")
        })))
        .mount(&server)
        .await;

    let (session, _store) = session_with_store(&server);
    assert_eq!(session.initialize().await, SessionStatus::Anonymous);

    session
        .login(Credentials::new("a@b.com", "secret"))
        .await
        .unwrap();

    // A repeat call reports the current state instead of re-probing
    assert_eq!(session.initialize().await, SessionStatus::Authenticated);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

// ============================================================================
// Logout and identity updates
// ============================================================================

#[tokio::test]
async fn logout_clears_session_even_when_remote_notification_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login/email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "token_type": "bearer",
            "user": identity_body("a@b.com", "ab")
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (session, store) = session_with_store(&server);
    session.initialize().await;
    session
        .login(Credentials::new("a@b.com", "secret"))
        .await
        .unwrap();

    session.logout().await;

    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert!(session.token().is_none());
    assert!(session.identity().is_none());
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn update_identity_replaces_profile_and_keeps_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login/email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "token_type": "bearer",
            "user": identity_body("a@b.com", "ab")
        })))
        .mount(&server)
        .await;

    let (session, store) = session_with_store(&server);
    session.initialize().await;
    session
        .login(Credentials::new("a@b.com", "secret"))
        .await
        .unwrap();

    let mut updated = session.identity().unwrap();
    updated.full_name = Some("New Name".to_string());
    session.update_identity(updated);

    assert_eq!(
        session.identity().unwrap().full_name.as_deref(),
        Some("New Name")
    );
    assert_eq!(session.token().unwrap(), "T1");
    assert_eq!(store.load().unwrap().unwrap(), "T1");
    assert_eq!(session.status(), SessionStatus::Authenticated);
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn register_never_mutates_the_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .and(body_json(json!({
            "email": "new@example.com",
            "username": "newbie",
            "password": "longenough"
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(identity_body("new@example.com", "newbie")),
        )
        .mount(&server)
        .await;

    let (session, store) = session_with_store(&server);
    session.initialize().await;

    let identity = session
        .register(RegistrationData {
            email: "new@example.com".to_string(),
            username: "newbie".to_string(),
            password: "longenough".to_string(),
            full_name: None,
            role: None,
        })
        .await
        .unwrap();

    assert_eq!(identity.email, "new@example.com");
    // Registration does not imply login
    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn register_failure_surfaces_server_detail() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "detail": "User with this email already exists"
        })))
        .mount(&server)
        .await;

    let (session, _store) = session_with_store(&server);

    let result = session
        .register(RegistrationData {
            email: "dup@example.com".to_string(),
            username: "dup".to_string(),
            password: "longenough".to_string(),
            full_name: None,
            role: None,
        })
        .await;

    match result {
        Err(Error::Registration(err)) => {
            assert_eq!(err.message(), "User with this email already exists")
        }
        other => panic!("expected registration error, got {:?}", other),
    }
}

// ============================================================================
// Token refresh and the blanket authorization policy
// ============================================================================

#[tokio::test]
async fn refresh_rotates_and_persists_the_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login/email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "token_type": "bearer",
            "user": identity_body("a@b.com", "ab")
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T2",
            "token_type": "bearer"
        })))
        .mount(&server)
        .await;

    let (session, store) = session_with_store(&server);
    session.initialize().await;
    session
        .login(Credentials::new("a@b.com", "secret"))
        .await
        .unwrap();

    session.refresh().await.unwrap();

    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_eq!(session.token().unwrap(), "T2");
    assert_eq!(store.load().unwrap().unwrap(), "T2");
    assert_eq!(session.identity().unwrap().email, "a@b.com");
}

#[tokio::test]
async fn unauthorized_response_forces_logout_and_fires_policy_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login/email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "token_type": "bearer",
            "user": identity_body("a@b.com", "ab")
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/change-password"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Could not validate credentials"
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let policy = Arc::new(CountingPolicy::default());
    let session = SessionManager::with_policy(
        mock_api_url(&server),
        Arc::clone(&store),
        Arc::clone(&policy),
    );

    session.initialize().await;
    session
        .login(Credentials::new("a@b.com", "secret"))
        .await
        .unwrap();

    let result = session.change_password("secret", "longer-secret").await;

    assert!(matches!(result, Err(Error::Authorization(_))));
    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert!(store.load().unwrap().is_none());
    assert_eq!(policy.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn change_password_validation_error_does_not_end_the_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login/email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T1",
            "token_type": "bearer",
            "user": identity_body("a@b.com", "ab")
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/change-password"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "detail": "Incorrect current password"
        })))
        .mount(&server)
        .await;

    let (session, store) = session_with_store(&server);
    session.initialize().await;
    session
        .login(Credentials::new("a@b.com", "secret"))
        .await
        .unwrap();

    let result = session.change_password("wrong", "longer-secret").await;

    match result {
        Err(err @ Error::Validation(_)) => {
            assert_eq!(err.user_message(), "Incorrect current password")
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    // Session survives an ordinary rejection
    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_eq!(store.load().unwrap().unwrap(), "T1");
}

#[tokio::test]
async fn password_reset_round_trip_returns_server_messages() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/reset-password"))
        .and(body_json(json!({"email": "a@b.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "If the email exists, a reset link has been sent"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/reset-password/confirm"))
        .and(body_json(json!({
            "token": "reset-token",
            "new_password": "longer-secret"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Password reset successfully"
        })))
        .mount(&server)
        .await;

    let (session, _store) = session_with_store(&server);

    let message = session.request_password_reset("a@b.com").await.unwrap();
    assert_eq!(message, "If the email exists, a reset link has been sent");

    let message = session
        .confirm_password_reset("reset-token", "longer-secret")
        .await
        .unwrap();
    assert_eq!(message, "Password reset successfully");
}
