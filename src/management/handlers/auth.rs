//! # 认证处理器
//!
//! 登录下发会话 Cookie，登出清除 Cookie，会话查询返回当前身份。

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

use super::extract::ApiJson;
use crate::auth::cookie::{clear_session_cookie, session_cookie};
use crate::error::{AppError, ErrorCategory};
use crate::lerror;
use crate::logging::{LogComponent, LogStage};
use crate::management::middleware::ClientInfo;
use crate::management::server::AppState;
use crate::management::services::AuthManagementService;

/// 登录过程中基础设施故障时的提示
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please try again.";

/// 登录请求
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn with_cookie(mut response: Response, cookie: Option<HeaderValue>) -> Response {
    if let Some(cookie) = cookie {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

fn login_failed(request_id: &str, err: &AppError) -> Response {
    lerror!(
        request_id,
        LogStage::Authentication,
        LogComponent::Auth,
        "login_error",
        &format!("Login failed due to server error: {err:?}")
    );
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": LOGIN_FAILED_MESSAGE })),
    )
        .into_response()
}

/// 用户登录
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Response {
    let service = AuthManagementService::new(&state);
    match service
        .login(&request.email, &request.password, &client)
        .await
    {
        Ok(output) => {
            let Some(cookie) = session_cookie(&state.config.auth, &output.token) else {
                return login_failed(
                    &client.request_id,
                    &AppError::internal("Session cookie could not be encoded"),
                );
            };
            let body = Json(json!({ "success": true, "user": output.user }));
            with_cookie(body.into_response(), Some(cookie))
        }
        Err(err) if err.category() == ErrorCategory::Server => {
            login_failed(&client.request_id, &err)
        }
        Err(err) => err.into_response(),
    }
}

/// 用户登出，无论会话是否存在都返回成功
pub async fn logout(
    State(state): State<AppState>,
    client: ClientInfo,
    headers: HeaderMap,
) -> Response {
    let token = state.resolver.token_from_headers(&headers);
    AuthManagementService::new(&state)
        .logout(token.as_deref(), &client)
        .await;

    with_cookie(
        Json(json!({ "success": true })).into_response(),
        clear_session_cookie(&state.config.auth),
    )
}

/// 查询当前会话
pub async fn session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match AuthManagementService::new(&state).session(&headers).await {
        Some(identity) => Json(json!({ "authenticated": true, "user": identity })).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "authenticated": false })),
        )
            .into_response(),
    }
}
