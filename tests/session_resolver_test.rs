//! # 会话存储与解析测试

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue, header};
use chrono::{Duration, Utc};
use entity::{roles, user_sessions, users};
use franchise_office::auth::{PermissionKey, SessionResolution, SessionResolver, SessionStore};
use franchise_office::testing::*;
use pretty_assertions::assert_eq;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait, Set,
};

async fn expire(app: &TestApp, session_id: i32) {
    let session = user_sessions::Entity::find_by_id(session_id)
        .one(app.db())
        .await
        .unwrap()
        .unwrap();
    let mut active = session.into_active_model();
    active.expires_at = Set(Utc::now().naive_utc() - Duration::minutes(5));
    active.update(app.db()).await.unwrap();
}

async fn session_total(app: &TestApp) -> u64 {
    user_sessions::Entity::find().count(app.db()).await.unwrap()
}

async fn setup() -> (TestApp, users::Model) {
    let app = TestApp::new().await;
    let role = RoleFixture::new("staff")
        .grant(&[PermissionKey::ViewDashboard])
        .insert(app.db())
        .await;
    let user = UserFixture::new(role.id).insert(app.db()).await;
    (app, user)
}

#[tokio::test]
async fn test_valid_session_resolves_identity() {
    let (app, user) = setup().await;
    let issued = app.ctx.sessions.create(user.id, Some("cli"), None).await.unwrap();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_str(&format!("theme=dark; {}={}", app.cookie_name(), issued.token))
            .unwrap(),
    );

    let identity = app.ctx.resolver.resolve(&headers).await.unwrap();
    assert_eq!(identity.user_id, user.id);
    assert_eq!(identity.emp_id, user.emp_id);
    assert_eq!(identity.session_id, issued.session.id);
    assert!(identity.permissions.get(PermissionKey::ViewDashboard));
    assert!(!identity.permissions.get(PermissionKey::ManageUsers));
}

#[tokio::test]
async fn test_missing_cookie_is_invalid() {
    let (app, _) = setup().await;
    let resolution = app.ctx.resolver.resolve_headers(&HeaderMap::new()).await;
    assert!(matches!(resolution, SessionResolution::Invalid));

    let unknown = app.ctx.resolver.resolve_token("not-a-real-token").await;
    assert!(matches!(unknown, SessionResolution::Invalid));
}

#[tokio::test]
async fn test_expired_session_is_deleted_on_lookup() {
    let (app, user) = setup().await;
    let issued = app.ctx.sessions.create(user.id, None, None).await.unwrap();
    expire(&app, issued.session.id).await;

    let resolution = app.ctx.resolver.resolve_token(&issued.token).await;
    assert!(matches!(resolution, SessionResolution::Invalid));
    assert_eq!(session_total(&app).await, 0);
}

#[tokio::test]
async fn test_inactive_user_session_is_deleted() {
    let (app, user) = setup().await;
    let issued = app.ctx.sessions.create(user.id, None, None).await.unwrap();

    let mut active = user.into_active_model();
    active.status = Set("inactive".to_string());
    active.update(app.db()).await.unwrap();

    let resolution = app.ctx.resolver.resolve_token(&issued.token).await;
    assert!(matches!(resolution, SessionResolution::Invalid));
    assert_eq!(session_total(&app).await, 0);
}

#[tokio::test]
async fn test_unreadable_role_permissions_deny_but_keep_session() {
    let app = TestApp::new().await;
    let role = RoleFixture::new("broken")
        .raw_permissions("{not json")
        .insert(app.db())
        .await;
    let user = UserFixture::new(role.id).insert(app.db()).await;
    let issued = app.ctx.sessions.create(user.id, None, None).await.unwrap();

    let resolution = app.ctx.resolver.resolve_token(&issued.token).await;
    assert!(matches!(resolution, SessionResolution::Invalid));
    assert_eq!(session_total(&app).await, 1);
}

#[tokio::test]
async fn test_missing_role_denies_but_keeps_session() {
    let (app, user) = setup().await;
    let issued = app.ctx.sessions.create(user.id, None, None).await.unwrap();

    // 测试库只有一个连接，关闭外键后可删除仍被引用的角色
    app.db()
        .execute_unprepared("PRAGMA foreign_keys = OFF")
        .await
        .unwrap();
    roles::Entity::delete_by_id(user.role_id)
        .exec(app.db())
        .await
        .unwrap();

    let resolution = app.ctx.resolver.resolve_token(&issued.token).await;
    assert!(matches!(resolution, SessionResolution::Invalid));
    assert_eq!(session_total(&app).await, 1);
}

#[tokio::test]
async fn test_touch_moves_last_activity() {
    let (app, user) = setup().await;
    let issued = app.ctx.sessions.create(user.id, None, None).await.unwrap();

    let stale_at = Utc::now().naive_utc() - Duration::hours(2);
    let mut active = issued.session.clone().into_active_model();
    active.last_activity_at = Set(stale_at);
    active.update(app.db()).await.unwrap();

    app.ctx.sessions.touch(issued.session.id).await.unwrap();

    let touched = user_sessions::Entity::find_by_id(issued.session.id)
        .one(app.db())
        .await
        .unwrap()
        .unwrap();
    assert!(touched.last_activity_at > stale_at + Duration::hours(1));
    assert_eq!(touched.expires_at, issued.session.expires_at);
}

#[tokio::test]
async fn test_storage_failure_is_unauthenticated() {
    init_test_env();
    // 未迁移的库：查询会话表失败
    let db = Arc::new(connect_memory_db().await.unwrap());
    let sessions = Arc::new(SessionStore::new(Arc::clone(&db), Duration::hours(1)));
    let resolver = SessionResolver::new(db, sessions, "rummi_session");

    let resolution = resolver.resolve_token("anything").await;
    assert!(matches!(resolution, SessionResolution::StorageError(_)));

    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_static("rummi_session=anything"));
    assert!(resolver.resolve(&headers).await.is_none());
}

#[tokio::test]
async fn test_sweeper_removes_only_expired_sessions() {
    let (app, user) = setup().await;
    let stale = app.ctx.sessions.create(user.id, None, None).await.unwrap();
    app.ctx.sessions.create(user.id, None, None).await.unwrap();
    expire(&app, stale.session.id).await;

    let removed = app.ctx.session_sweeper().sweep_once().await.unwrap();
    assert_eq!(removed, 1);
    assert_eq!(session_total(&app).await, 1);

    let removed = app.ctx.session_sweeper().sweep_once().await.unwrap();
    assert_eq!(removed, 0);
}

#[tokio::test]
async fn test_delete_all_for_user() {
    let (app, user) = setup().await;
    for _ in 0..3 {
        app.ctx.sessions.create(user.id, None, None).await.unwrap();
    }
    let other = UserFixture::new(user.role_id).insert(app.db()).await;
    app.ctx.sessions.create(other.id, None, None).await.unwrap();

    let removed = app.ctx.sessions.delete_all_for_user(user.id).await.unwrap();
    assert_eq!(removed, 3);
    assert_eq!(session_total(&app).await, 1);
}
