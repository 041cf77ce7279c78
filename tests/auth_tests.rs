//! # 认证接口集成测试
//!
//! 登录、登出与会话查询的完整 HTTP 流程

use axum::http::StatusCode;
use entity::{attendance, audit_logs, user_sessions};
use franchise_office::auth::PermissionKey;
use franchise_office::auth::token::hash_token;
use franchise_office::testing::*;
use pretty_assertions::assert_eq;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

async fn setup() -> (TestApp, entity::users::Model) {
    let app = TestApp::new().await;
    let role = RoleFixture::new("hr-manager")
        .grant(&[PermissionKey::ManageUsers])
        .insert(app.db())
        .await;
    let user = UserFixture::new(role.id)
        .email("hr@example.com")
        .insert(app.db())
        .await;
    (app, user)
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let (app, user) = setup().await;

    let response = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "HR@Example.com", "password": TEST_PASSWORD}),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], json!(true));
    assert_eq!(response.body["user"]["id"], json!(user.id));
    assert_eq!(response.body["user"]["empId"], json!(user.emp_id));

    let cookie = response.set_cookie().expect("missing Set-Cookie");
    assert!(cookie.starts_with("rummi_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=604800"));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn test_session_token_is_stored_hashed() {
    let (app, user) = setup().await;
    let token = app.login("hr@example.com", TEST_PASSWORD).await;
    assert_eq!(token.len(), 64);

    let sessions = user_sessions::Entity::find()
        .filter(user_sessions::Column::UserId.eq(user.id))
        .all(app.db())
        .await
        .unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].token_hash, hash_token(&token));
    assert_ne!(sessions[0].token_hash, token);
    assert_eq!(sessions[0].ip_address.as_deref(), Some("203.0.113.7"));
    assert_eq!(sessions[0].device_info.as_deref(), Some("integration-test"));
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_share_message() {
    let (app, _user) = setup().await;

    let wrong = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "hr@example.com", "password": "not-the-password"}),
        )
        .await;
    let unknown = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "nobody@example.com", "password": TEST_PASSWORD}),
        )
        .await;

    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.error(), Some("Invalid email or password"));
    assert_eq!(wrong.body, unknown.body);
    assert!(wrong.set_cookie().is_none());
}

#[tokio::test]
async fn test_user_without_password_cannot_login() {
    let (app, user) = setup().await;
    UserFixture::new(user.role_id)
        .email("nopass@example.com")
        .without_password()
        .insert(app.db())
        .await;

    let response = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "nopass@example.com", "password": TEST_PASSWORD}),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error(), Some("Invalid email or password"));
}

#[tokio::test]
async fn test_disabled_account() {
    let (app, user) = setup().await;
    UserFixture::new(user.role_id)
        .email("gone@example.com")
        .inactive()
        .insert(app.db())
        .await;

    let correct = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "gone@example.com", "password": TEST_PASSWORD}),
        )
        .await;
    assert_eq!(correct.status, StatusCode::FORBIDDEN);
    assert_eq!(correct.error(), Some("Account is disabled. Please contact HR."));

    let wrong = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "gone@example.com", "password": "wrong-password"}),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_login_body() {
    let (app, _user) = setup().await;

    let missing = app
        .post("/api/auth/login", None, json!({"email": "hr@example.com"}))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert!(missing.error().is_some());

    let bad_email = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "not-an-email", "password": "x"}),
        )
        .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_email.error(), Some("Invalid email address"));

    let empty_password = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "hr@example.com", "password": ""}),
        )
        .await;
    assert_eq!(empty_password.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty_password.error(), Some("Password is required"));
}

#[tokio::test]
async fn test_session_endpoint() {
    let (app, user) = setup().await;

    let anonymous = app.get("/api/auth/session", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.body, json!({"authenticated": false}));

    let token = app.login("hr@example.com", TEST_PASSWORD).await;
    let response = app.get("/api/auth/session", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["authenticated"], json!(true));

    let identity = &response.body["user"];
    assert_eq!(identity["userId"], json!(user.id));
    assert_eq!(identity["email"], json!("hr@example.com"));
    assert_eq!(identity["roleName"], json!("hr-manager"));
    assert_eq!(identity["locationType"], json!("ho"));
    assert_eq!(identity["permissions"]["canManageUsers"], json!(true));
    assert_eq!(identity["permissions"]["canManageFranchises"], json!(false));
    assert!(identity.get("sessionId").is_none());
}

#[tokio::test]
async fn test_logout_revokes_session_and_clears_cookie() {
    let (app, user) = setup().await;
    let token = app.login("hr@example.com", TEST_PASSWORD).await;

    let response = app.post("/api/auth/logout", Some(&token), json!({})).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"success": true}));
    let cookie = response.set_cookie().expect("missing Set-Cookie");
    assert!(cookie.starts_with("rummi_session=;"));
    assert!(cookie.contains("Max-Age=0"));

    let after = app.get("/api/auth/session", Some(&token)).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);

    let logouts = audit_logs::Entity::find()
        .filter(audit_logs::Column::UserId.eq(user.id))
        .filter(audit_logs::Column::Action.eq("logout"))
        .count(app.db())
        .await
        .unwrap();
    assert_eq!(logouts, 1);
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let (app, _user) = setup().await;
    let token = app.login("hr@example.com", TEST_PASSWORD).await;

    let first = app.post("/api/auth/logout", Some(&token), json!({})).await;
    let second = app.post("/api/auth/logout", Some(&token), json!({})).await;
    let anonymous = app.post("/api/auth/logout", None, json!({})).await;

    for response in [first, second, anonymous] {
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({"success": true}));
        assert!(response.set_cookie().unwrap().contains("Max-Age=0"));
    }
}

#[tokio::test]
async fn test_login_records_audit_and_daily_attendance() {
    let (app, user) = setup().await;
    app.login("hr@example.com", TEST_PASSWORD).await;
    app.login("hr@example.com", TEST_PASSWORD).await;

    let logins = audit_logs::Entity::find()
        .filter(audit_logs::Column::UserId.eq(user.id))
        .filter(audit_logs::Column::Action.eq("login"))
        .all(app.db())
        .await
        .unwrap();
    assert_eq!(logins.len(), 2);
    assert_eq!(logins[0].module, "authentication");
    assert_eq!(logins[0].ip_address.as_deref(), Some("203.0.113.7"));
    let details: serde_json::Value =
        serde_json::from_str(logins[0].details.as_deref().unwrap()).unwrap();
    assert_eq!(details, json!({"loginMethod": "password"}));

    let days = attendance::Entity::find()
        .filter(attendance::Column::UserId.eq(user.id))
        .count(app.db())
        .await
        .unwrap();
    assert_eq!(days, 1);

    let sessions = user_sessions::Entity::find()
        .filter(user_sessions::Column::UserId.eq(user.id))
        .count(app.db())
        .await
        .unwrap();
    assert_eq!(sessions, 2);
}

#[tokio::test]
async fn test_ping() {
    let app = TestApp::new().await;
    let response = app.get("/ping", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!("pong"));
}
