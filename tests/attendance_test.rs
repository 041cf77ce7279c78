//! # 考勤接口集成测试

use axum::http::StatusCode;
use chrono::{NaiveDate, Utc};
use entity::attendance;
use franchise_office::auth::PermissionKey;
use franchise_office::error::ErrorCategory;
use franchise_office::management::services::attendance as attendance_service;
use franchise_office::testing::*;
use pretty_assertions::assert_eq;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::json;

async fn insert_day(db: &DatabaseConnection, user_id: i32, date: &str) {
    let login_time = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();
    attendance::ActiveModel {
        user_id: Set(user_id),
        date: Set(date.to_string()),
        login_time: Set(login_time),
        created_at: Set(login_time),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}

struct Suite {
    app: TestApp,
    token: String,
    manager_id: i32,
    staff_id: i32,
}

impl Suite {
    async fn setup() -> Self {
        let app = TestApp::new().await;
        let role = RoleFixture::new("hr")
            .grant(&[PermissionKey::ManageUsers])
            .insert(app.db())
            .await;
        let manager = UserFixture::new(role.id).insert(app.db()).await;
        let staff = UserFixture::new(role.id).insert(app.db()).await;
        let token = app.login(&manager.email, TEST_PASSWORD).await;

        for date in ["2024-03-01", "2024-03-02", "2024-04-15"] {
            insert_day(app.db(), staff.id, date).await;
        }

        Self {
            app,
            token,
            manager_id: manager.id,
            staff_id: staff.id,
        }
    }
}

#[tokio::test]
async fn test_list_orders_newest_first_with_user() {
    let suite = Suite::setup().await;
    let response = suite
        .app
        .get("/api/hr/attendance", Some(&suite.token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let records = response.body["data"].as_array().unwrap();
    // 经理登录当天产生一条记录
    assert_eq!(records.len(), 4);
    assert_eq!(records[0]["userId"], json!(suite.manager_id));
    assert_eq!(
        records[0]["date"],
        json!(Utc::now().date_naive().format("%Y-%m-%d").to_string())
    );
    assert_eq!(records[1]["date"], json!("2024-04-15"));
    assert_eq!(records[3]["date"], json!("2024-03-01"));
    assert!(records[1]["user"]["empId"].is_string());
    assert_eq!(response.body["pagination"]["limit"], json!(25));
}

#[tokio::test]
async fn test_list_filters() {
    let suite = Suite::setup().await;

    let by_user = suite
        .app
        .get(
            &format!("/api/hr/attendance?userId={}", suite.staff_id),
            Some(&suite.token),
        )
        .await;
    assert_eq!(by_user.body["pagination"]["total"], json!(3));

    let by_range = suite
        .app
        .get(
            "/api/hr/attendance?startDate=2024-03-01&endDate=2024-03-31",
            Some(&suite.token),
        )
        .await;
    let records = by_range.body["data"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["date"], json!("2024-03-02"));

    let bad_date = suite
        .app
        .get("/api/hr/attendance?startDate=March", Some(&suite.token))
        .await;
    assert_eq!(bad_date.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_history_with_stats() {
    let suite = Suite::setup().await;
    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    insert_day(suite.app.db(), suite.staff_id, &today).await;

    let response = suite
        .app
        .get(
            &format!("/api/hr/attendance/{}", suite.staff_id),
            Some(&suite.token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let data = &response.body["data"];
    assert_eq!(data["attendance"].as_array().unwrap().len(), 4);
    assert_eq!(data["attendance"][0]["date"], json!(today));
    assert_eq!(
        data["stats"],
        json!({"totalDays": 4, "thisMonth": 1, "thisYear": 1})
    );

    let limited = suite
        .app
        .get(
            &format!("/api/hr/attendance/{}?limit=2", suite.staff_id),
            Some(&suite.token),
        )
        .await;
    assert_eq!(limited.body["data"]["stats"]["totalDays"], json!(2));
}

#[tokio::test]
async fn test_history_for_user_without_records() {
    let suite = Suite::setup().await;
    let response = suite
        .app
        .get("/api/hr/attendance/999", Some(&suite.token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["data"],
        json!({"attendance": [], "stats": {"totalDays": 0, "thisMonth": 0, "thisYear": 0}})
    );
}

#[tokio::test]
async fn test_record_login_once_per_day() {
    let app = TestApp::new().await;
    let role = RoleFixture::new("staff").insert(app.db()).await;
    let user = UserFixture::new(role.id).insert(app.db()).await;

    assert!(attendance_service::record_login(app.db(), user.id).await.unwrap());
    assert!(!attendance_service::record_login(app.db(), user.id).await.unwrap());
}

#[tokio::test]
async fn test_record_login_reports_storage_failure() {
    init_test_env();
    // 未迁移的库：考勤表不存在
    let db = connect_memory_db().await.unwrap();

    let err = attendance_service::record_login(&db, 1).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Server);
}
