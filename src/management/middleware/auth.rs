//! # 认证中间件
//!
//! 从 Cookie 解析会话并校验权限，通过后把已认证身份注入到请求扩展中。
//! 处理器返回的错误原样透传。

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{GateError, PermissionKey};
use crate::management::server::AppState;

/// 权限中间件状态：应用状态加上所需权限
#[derive(Clone)]
pub struct PermissionGuard {
    pub state: AppState,
    pub key: PermissionKey,
}

impl PermissionGuard {
    #[must_use]
    pub const fn new(state: AppState, key: PermissionKey) -> Self {
        Self { state, key }
    }
}

/// 要求有效会话且拥有指定权限
pub async fn require_permission(
    State(guard): State<PermissionGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    let result: Result<_, GateError> = guard
        .state
        .gate
        .require_permission(request.headers(), guard.key)
        .await;

    match result {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedIdentity;
    use crate::error::AppError;
    use crate::testing::{RoleFixture, TEST_PASSWORD, TestApp, UserFixture};
    use axum::Router;
    use axum::body::Body;
    use axum::extract::Extension;
    use axum::http::{StatusCode, header};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use tower::ServiceExt;

    fn guarded_router(app: &TestApp) -> Router {
        let state = AppState::new(app.ctx.clone());
        let guard = PermissionGuard::new(state.clone(), PermissionKey::ViewReports);
        Router::new()
            .route(
                "/me",
                get(|Extension(identity): Extension<AuthenticatedIdentity>| async move {
                    identity.emp_id
                }),
            )
            .route(
                "/boom",
                get(|| async { AppError::not_found("Widget", "1").into_response() }),
            )
            .route_layer(from_fn_with_state(guard, require_permission))
            .with_state(state)
    }

    async fn call(router: Router, uri: &str, cookie: Option<String>) -> Response {
        let mut request = axum::http::Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        router
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_require_permission_injects_identity() {
        let app = TestApp::new().await;
        let role = RoleFixture::new("viewer")
            .grant(&[PermissionKey::ViewReports])
            .insert(app.db())
            .await;
        let user = UserFixture::new(role.id).insert(app.db()).await;
        let token = app.login(&user.email, TEST_PASSWORD).await;
        let cookie = format!("{}={token}", app.cookie_name());

        let response = call(guarded_router(&app), "/me", Some(cookie.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, user.emp_id.as_bytes());

        // 处理器自身的错误不被改写
        let response = call(guarded_router(&app), "/boom", Some(cookie)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_require_permission_rejects() {
        let app = TestApp::new().await;
        let role = RoleFixture::new("clerk")
            .grant(&[PermissionKey::ViewDashboard])
            .insert(app.db())
            .await;
        let user = UserFixture::new(role.id).insert(app.db()).await;
        let token = app.login(&user.email, TEST_PASSWORD).await;
        let response = call(
            guarded_router(&app),
            "/me",
            Some(format!("{}={token}", app.cookie_name())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = call(guarded_router(&app), "/me", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = call(
            guarded_router(&app),
            "/me",
            Some(format!("{}=forged", app.cookie_name())),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
