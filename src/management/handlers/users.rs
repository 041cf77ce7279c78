//! # 用户管理处理器
//!
//! 处理 HTTP 请求，委托具体业务给 `UsersService`。

use axum::extract::{Extension, State};
use axum::response::Response;
use serde_json::json;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::auth::AuthenticatedIdentity;
use crate::lerror;
use crate::logging::{LogComponent, LogStage};
use crate::management::middleware::ClientInfo;
use crate::management::response;
use crate::management::server::AppState;
use crate::management::services::UsersService;
use crate::management::services::users::{
    CreateUserRequest, ResetPasswordRequest, UpdateUserRequest, UserListQuery,
};
use crate::error::{AppError, ErrorCategory};

fn failed(client: &ClientInfo, operation: &str, err: AppError) -> Response {
    if err.category() == ErrorCategory::Server {
        lerror!(
            &client.request_id,
            LogStage::Internal,
            LogComponent::Users,
            operation,
            &format!("{err:?}")
        );
    }
    response::app_error(err)
}

/// 用户列表
pub async fn list_users(
    State(state): State<AppState>,
    client: ClientInfo,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Response {
    match UsersService::new(&state).list(&query).await {
        Ok(result) => response::paginated(result.users, result.pagination),
        Err(err) => failed(&client, "list_users_fail", err),
    }
}

/// 用户详情
pub async fn get_user(
    State(state): State<AppState>,
    client: ClientInfo,
    ApiPath(id): ApiPath<i32>,
) -> Response {
    match UsersService::new(&state).get(id).await {
        Ok(user) => response::success(user),
        Err(err) => failed(&client, "get_user_fail", err),
    }
}

/// 创建用户
pub async fn create_user(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedIdentity>,
    client: ClientInfo,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> Response {
    match UsersService::new(&state).create(&actor, &client, request).await {
        Ok(user) => response::created(user, "User created successfully"),
        Err(err) => failed(&client, "create_user_fail", err),
    }
}

/// 更新用户
pub async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedIdentity>,
    client: ClientInfo,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Response {
    match UsersService::new(&state)
        .update(&actor, &client, id, request)
        .await
    {
        Ok(user) => response::success_with_message(user, "User updated successfully"),
        Err(err) => failed(&client, "update_user_fail", err),
    }
}

/// 停用用户
pub async fn deactivate_user(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedIdentity>,
    client: ClientInfo,
    ApiPath(id): ApiPath<i32>,
) -> Response {
    match UsersService::new(&state).deactivate(&actor, &client, id).await {
        Ok(()) => response::success_with_message(json!({ "id": id }), "User deactivated successfully"),
        Err(err) => failed(&client, "deactivate_user_fail", err),
    }
}

/// 重置密码
pub async fn reset_password(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedIdentity>,
    client: ClientInfo,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> Response {
    match UsersService::new(&state)
        .reset_password(&actor, &client, id, request)
        .await
    {
        Ok(()) => response::success_with_message(
            json!({ "id": id }),
            "Password reset successfully. User must login again.",
        ),
        Err(err) => failed(&client, "reset_password_fail", err),
    }
}
