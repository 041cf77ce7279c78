//! # 内置角色与管理员初始化测试

use axum::http::StatusCode;
use entity::{roles, users};
use franchise_office::seed::{self, AdminSeed, SUPERADMIN_ROLE};
use franchise_office::testing::*;
use pretty_assertions::assert_eq;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

async fn role_id(app: &TestApp, name: &str) -> i32 {
    roles::Entity::find()
        .filter(roles::Column::Name.eq(name))
        .one(app.db())
        .await
        .unwrap()
        .unwrap()
        .id
}

#[tokio::test]
async fn test_hr_manager_and_sales_agent_scenario() {
    let app = TestApp::new().await;
    seed::ensure_system_roles(app.db()).await.unwrap();

    let hr = UserFixture::new(role_id(&app, "hr-manager").await)
        .insert(app.db())
        .await;
    let agent = UserFixture::new(role_id(&app, "sales-agent").await)
        .insert(app.db())
        .await;

    let hr_token = app.login(&hr.email, TEST_PASSWORD).await;
    let agent_token = app.login(&agent.email, TEST_PASSWORD).await;

    let allowed = app.get("/api/hr/users", Some(&hr_token)).await;
    assert_eq!(allowed.status, StatusCode::OK);

    let denied = app.get("/api/hr/users", Some(&agent_token)).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert_eq!(denied.error(), Some("Forbidden: Insufficient permissions"));

    let anonymous = app.get("/api/hr/users", None).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.error(), Some("Unauthorized"));

    // 会话解析出的权限与角色存储的权限一致
    let session = app.get("/api/auth/session", Some(&hr_token)).await;
    assert_eq!(session.body["user"]["roleName"], json!("hr-manager"));
    assert_eq!(
        session.body["user"]["permissions"]["canManageUsers"],
        json!(true)
    );
    assert_eq!(
        session.body["user"]["permissions"]["canManageFranchises"],
        json!(false)
    );
}

#[tokio::test]
async fn test_roles_endpoint_lists_seeded_roles() {
    let app = TestApp::new().await;
    seed::ensure_system_roles(app.db()).await.unwrap();
    seed::ensure_system_roles(app.db()).await.unwrap();
    assert_eq!(roles::Entity::find().count(app.db()).await.unwrap(), 5);

    let hr = UserFixture::new(role_id(&app, "hr-manager").await)
        .insert(app.db())
        .await;
    let token = app.login(&hr.email, TEST_PASSWORD).await;

    let response = app.get("/api/roles", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    let names: Vec<&str> = response.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "finance-manager",
            "franchise-owner",
            "hr-manager",
            "sales-agent",
            SUPERADMIN_ROLE
        ]
    );
    assert_eq!(response.body["data"][0]["isSystemRole"], json!(true));
}

#[tokio::test]
async fn test_admin_seed_creates_working_superadmin_once() {
    let app = TestApp::new().await;
    let admin = AdminSeed::from_lookup(|key| match key {
        "ADMIN_EMAIL" => Some("Owner@Example.com".to_string()),
        "ADMIN_PASSWORD" => Some("owner-secret".to_string()),
        _ => None,
    });

    let missing_roles = seed::ensure_admin_user(app.db(), &admin, TEST_BCRYPT_COST).await;
    assert!(missing_roles.is_err());

    seed::ensure_system_roles(app.db()).await.unwrap();
    assert!(
        seed::ensure_admin_user(app.db(), &admin, TEST_BCRYPT_COST)
            .await
            .unwrap()
    );
    assert!(
        !seed::ensure_admin_user(app.db(), &admin, TEST_BCRYPT_COST)
            .await
            .unwrap()
    );
    assert_eq!(users::Entity::find().count(app.db()).await.unwrap(), 1);

    let token = app.login("owner@example.com", "owner-secret").await;
    let response = app.get("/api/audit-logs", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
}
