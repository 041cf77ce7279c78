//! # 测试辅助函数
//!
//! 内存数据库、完整路由的测试应用，以及常用断言宏

use std::sync::{Arc, Once};

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use serde_json::{Value, json};
use tower::ServiceExt;
use tracing::Level;

use super::fixtures::TEST_BCRYPT_COST;
use crate::app::AppContext;
use crate::auth::cookie::parse_cookie;
use crate::config::AppConfig;
use crate::management::{AppState, build_router};

static INIT: Once = Once::new();

/// 初始化测试环境
pub fn init_test_env() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// 创建已迁移的内存数据库连接
///
/// 连接池固定为单连接，否则每个连接各自是一个空库。
pub async fn create_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = connect_memory_db().await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// 未迁移的内存数据库连接
pub async fn connect_memory_db() -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    Database::connect(options).await
}

/// 测试配置：低 bcrypt 成本、内存数据库
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.auth.bcrypt_cost = TEST_BCRYPT_COST;
    config
}

/// 测试响应
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `Set-Cookie` 头的原始值
    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
    }

    /// 错误响应中的 `error` 字段
    pub fn error(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

/// 完整路由的测试应用
pub struct TestApp {
    pub ctx: Arc<AppContext>,
    pub router: Router,
}

impl TestApp {
    /// 使用已迁移的内存数据库创建
    pub async fn new() -> Self {
        init_test_env();
        let db = create_test_db().await.expect("创建测试数据库失败");
        Self::with_db(db)
    }

    pub fn with_db(db: DatabaseConnection) -> Self {
        let config = Arc::new(test_config());
        let ctx = Arc::new(AppContext::new(Arc::clone(&config), Arc::new(db)));
        let router = build_router(AppState::new(Arc::clone(&ctx)), &config.server);
        Self { ctx, router }
    }

    pub fn db(&self) -> &DatabaseConnection {
        self.ctx.db.as_ref()
    }

    /// 会话 Cookie 名称
    pub fn cookie_name(&self) -> &str {
        &self.ctx.config.auth.cookie_name
    }

    /// 发送请求；`token` 作为会话 Cookie 携带
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::USER_AGENT, "integration-test")
            .header("x-forwarded-for", "203.0.113.7");
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("{}={token}", self.cookie_name()));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("构建请求失败");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("请求处理失败");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("读取响应体失败");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// 登录并返回会话令牌
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post(
                "/api/auth/login",
                None,
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "登录失败: {:?}", response.body);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            response
                .headers
                .get(header::SET_COOKIE)
                .expect("缺少 Set-Cookie")
                .clone(),
        );
        parse_cookie(&headers, self.cookie_name()).expect("Set-Cookie 中没有会话令牌")
    }
}
