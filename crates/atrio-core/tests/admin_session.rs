//! Integration tests for the admin session and the admin management calls.
//!
//! The admin realm shares a token file with the user realm but owns its own
//! key; several tests pin down that the two never bleed into each other.


use std::path::Path;

use atrio_core::api::types::{AdminCreate, AdminRole, AdminUpdate, Credentials, TwoFactorSettings};
use atrio_core::api::{AdminApi, ApiConfig, ApiError, ApiErrorKind};
use atrio_core::session::{AdminSession, SessionState};
use atrio_core::store::{SessionKind, TokenStore};
use fixtures::{admin_json, can_bind_localhost, error_json, json_response};
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_at(dir: &Path, server_uri: &str) -> AdminSession {
    let api = AdminApi::new(&ApiConfig::for_base_url(server_uri)).expect("build admin api");
    let store = TokenStore::at(dir.join("tokens.json"), SessionKind::Admin);
    AdminSession::new(api, store)
}

fn admin_store(dir: &Path) -> TokenStore {
    TokenStore::at(dir.join("tokens.json"), SessionKind::Admin)
}

fn user_store(dir: &Path) -> TokenStore {
    TokenStore::at(dir.join("tokens.json"), SessionKind::User)
}

fn credentials(email: &str, password: &str) -> Credentials {
    Credentials {
        email: email.to_string(),
        password: password.to_string(),
    }
}

fn kind_of(err: &anyhow::Error) -> ApiErrorKind {
    err.downcast_ref::<ApiError>().expect("api error").kind
}

#[tokio::test]
async fn test_admin_login_round_trip() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let dir = tempdir().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/admin/auth/login"))
        .and(body_json(json!({
            "email": "root@example.com",
            "password": "hunter2",
        })))
        .respond_with(json_response(
            200,
            &json!({
                "access_token": "tok-admin-123456789",
                "token_type": "bearer",
                "role": "super_admin",
            }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/admin/users/me"))
        .and(header("authorization", "Bearer tok-admin-123456789"))
        .respond_with(json_response(
            200,
            &admin_json(1, "root@example.com", "root", "super_admin"),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_at(dir.path(), &server.uri());
    session.hydrate().await;
    session
        .login(&credentials("root@example.com", "hunter2"))
        .await
        .unwrap();

    assert!(session.state().is_authenticated());
    let principal = session.state().principal().unwrap();
    assert_eq!(principal.role, AdminRole::SuperAdmin);
    assert_eq!(
        admin_store(dir.path()).get().unwrap(),
        Some("tok-admin-123456789".to_string())
    );
}

#[tokio::test]
async fn test_user_token_does_not_hydrate_admin_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let dir = tempdir().unwrap();
    let server = MockServer::start().await;

    // Only the user slot is populated.
    user_store(dir.path()).set("tok-user-123456789").unwrap();

    Mock::given(method("GET"))
        .and(path("/api/admin/users/me"))
        .respond_with(json_response(
            200,
            &admin_json(1, "root@example.com", "root", "admin"),
        ))
        .expect(0)
        .mount(&server)
        .await;

    let mut session = session_at(dir.path(), &server.uri());
    session.hydrate().await;

    assert_eq!(*session.state(), SessionState::Anonymous);
    assert_eq!(
        user_store(dir.path()).get().unwrap(),
        Some("tok-user-123456789".to_string())
    );
}

#[tokio::test]
async fn test_admin_logout_leaves_user_token_alone() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let dir = tempdir().unwrap();
    let server = MockServer::start().await;

    user_store(dir.path()).set("tok-user-123456789").unwrap();
    admin_store(dir.path()).set("tok-admin-123456789").unwrap();

    // Remote failure must not block local teardown.
    Mock::given(method("POST"))
        .and(path("/api/admin/auth/logout"))
        .respond_with(json_response(503, &error_json(503, "Service unavailable")))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_at(dir.path(), &server.uri());
    session.logout().await.unwrap();

    assert_eq!(*session.state(), SessionState::Anonymous);
    assert_eq!(admin_store(dir.path()).get().unwrap(), None);
    assert_eq!(
        user_store(dir.path()).get().unwrap(),
        Some("tok-user-123456789".to_string())
    );
}

#[tokio::test]
async fn test_forbidden_admin_call_maps_cleanly() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let dir = tempdir().unwrap();
    let server = MockServer::start().await;

    admin_store(dir.path()).set("tok-admin-123456789").unwrap();

    Mock::given(method("POST"))
        .and(path("/api/admin/users"))
        .respond_with(json_response(
            403,
            &error_json(403, "Super admin privileges required"),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_at(dir.path(), &server.uri());
    let token = session.require_token().unwrap();

    let payload = AdminCreate {
        email: "second@example.com".to_string(),
        username: "second".to_string(),
        password: "hunter2".to_string(),
        role: AdminRole::Admin,
    };
    let err = session.api().create(&token, &payload).await.unwrap_err();

    assert_eq!(err.kind, ApiErrorKind::Forbidden);
    assert_eq!(err.message, "Super admin privileges required");
}

#[tokio::test]
async fn test_missing_admin_is_not_found() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let dir = tempdir().unwrap();
    let server = MockServer::start().await;

    admin_store(dir.path()).set("tok-admin-123456789").unwrap();

    Mock::given(method("GET"))
        .and(path("/api/admin/users/99"))
        .respond_with(json_response(404, &error_json(404, "Admin not found")))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_at(dir.path(), &server.uri());
    let token = session.require_token().unwrap();

    let err = session.api().get(&token, 99).await.unwrap_err();
    assert_eq!(err.kind, ApiErrorKind::NotFound);
    assert_eq!(err.message, "Admin not found");
}

#[tokio::test]
async fn test_duplicate_admin_is_a_validation_error() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let dir = tempdir().unwrap();
    let server = MockServer::start().await;

    admin_store(dir.path()).set("tok-admin-123456789").unwrap();

    // The reference backend reports duplicates as 400.
    Mock::given(method("POST"))
        .and(path("/api/admin/users"))
        .respond_with(json_response(400, &error_json(400, "Email already registered")))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_at(dir.path(), &server.uri());
    let token = session.require_token().unwrap();

    let payload = AdminCreate {
        email: "root@example.com".to_string(),
        username: "root2".to_string(),
        password: "hunter2".to_string(),
        role: AdminRole::Admin,
    };
    let err = session.api().create(&token, &payload).await.unwrap_err();

    assert_eq!(err.kind, ApiErrorKind::Validation);
    assert_eq!(err.message, "Email already registered");
}

#[tokio::test]
async fn test_admin_crud_round_trip() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let dir = tempdir().unwrap();
    let server = MockServer::start().await;

    admin_store(dir.path()).set("tok-admin-123456789").unwrap();

    Mock::given(method("POST"))
        .and(path("/api/admin/users"))
        .and(body_json(json!({
            "email": "second@example.com",
            "username": "second",
            "password": "hunter2",
            "role": "admin",
        })))
        .respond_with(json_response(
            201,
            &admin_json(2, "second@example.com", "second", "admin"),
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .respond_with(json_response(
            200,
            &json!([
                admin_json(1, "root@example.com", "root", "super_admin"),
                admin_json(2, "second@example.com", "second", "admin"),
            ]),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut deactivated = admin_json(2, "second@example.com", "second", "admin");
    deactivated["is_active"] = json!(false);
    Mock::given(method("PUT"))
        .and(path("/api/admin/users/2"))
        .and(body_json(json!({"is_active": false})))
        .respond_with(json_response(200, &deactivated))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/admin/users/2"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_at(dir.path(), &server.uri());
    let token = session.require_token().unwrap();
    let api = session.api();

    let created = api
        .create(
            &token,
            &AdminCreate {
                email: "second@example.com".to_string(),
                username: "second".to_string(),
                password: "hunter2".to_string(),
                role: AdminRole::Admin,
            },
        )
        .await
        .unwrap();
    assert_eq!(created.id, 2);
    assert_eq!(created.role, AdminRole::Admin);

    let admins = api.list(&token).await.unwrap();
    assert_eq!(admins.len(), 2);
    assert_eq!(admins[0].role, AdminRole::SuperAdmin);

    let updated = api
        .update(
            &token,
            2,
            &AdminUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!updated.is_active);

    api.delete(&token, 2).await.unwrap();
}

#[tokio::test]
async fn test_admin_sets_user_two_factor() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let dir = tempdir().unwrap();
    let server = MockServer::start().await;

    admin_store(dir.path()).set("tok-admin-123456789").unwrap();

    Mock::given(method("PUT"))
        .and(path("/api/admin/users/7/2fa"))
        .and(body_json(json!({"enable_2fa": true, "auth_profile_id": 3})))
        .respond_with(json_response(
            200,
            &json!({
                "message": "2FA settings updated successfully",
                "user_id": 7,
                "enable_2fa": true,
                "auth_profile_id": 3,
            }),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_at(dir.path(), &server.uri());
    let token = session.require_token().unwrap();

    let ack = session
        .api()
        .update_user_two_factor(&token, 7, &TwoFactorSettings::enabled(3))
        .await
        .unwrap();

    assert_eq!(ack.message, "2FA settings updated successfully");
    assert_eq!(ack.user_id, Some(7));
    assert!(ack.enable_2fa);
}

#[tokio::test]
async fn test_require_token_without_admin_login() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let dir = tempdir().unwrap();
    let server = MockServer::start().await;

    // A user token alone must not satisfy the admin realm.
    user_store(dir.path()).set("tok-user-123456789").unwrap();

    let session = session_at(dir.path(), &server.uri());
    let err = session.require_token().unwrap_err();
    assert_eq!(kind_of(&err), ApiErrorKind::Auth);
}
