//! # 加盟店处理器

use axum::extract::{Extension, State};
use axum::response::Response;
use serde_json::json;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::auth::AuthenticatedIdentity;
use crate::error::{AppError, ErrorCategory};
use crate::lerror;
use crate::logging::{LogComponent, LogStage};
use crate::management::middleware::ClientInfo;
use crate::management::response;
use crate::management::server::AppState;
use crate::management::services::FranchisesService;
use crate::management::services::franchises::{
    CreateFranchiseRequest, FranchiseListQuery, UpdateFranchiseRequest,
};

fn failed(client: &ClientInfo, operation: &str, err: AppError) -> Response {
    if err.category() == ErrorCategory::Server {
        lerror!(
            &client.request_id,
            LogStage::Internal,
            LogComponent::Franchises,
            operation,
            &format!("{err:?}")
        );
    }
    response::app_error(err)
}

/// 加盟店列表
pub async fn list_franchises(
    State(state): State<AppState>,
    client: ClientInfo,
    ApiQuery(query): ApiQuery<FranchiseListQuery>,
) -> Response {
    match FranchisesService::new(&state).list(&query).await {
        Ok(result) => response::paginated(result.franchises, result.pagination),
        Err(err) => failed(&client, "list_franchises_fail", err),
    }
}

/// 加盟店详情
pub async fn get_franchise(
    State(state): State<AppState>,
    client: ClientInfo,
    ApiPath(id): ApiPath<i32>,
) -> Response {
    match FranchisesService::new(&state).get(id).await {
        Ok(franchise) => response::success(franchise),
        Err(err) => failed(&client, "get_franchise_fail", err),
    }
}

/// 创建加盟店
pub async fn create_franchise(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedIdentity>,
    client: ClientInfo,
    ApiJson(request): ApiJson<CreateFranchiseRequest>,
) -> Response {
    match FranchisesService::new(&state)
        .create(&actor, &client, request)
        .await
    {
        Ok(franchise) => response::created(franchise, "Franchise created successfully"),
        Err(err) => failed(&client, "create_franchise_fail", err),
    }
}

/// 更新加盟店
pub async fn update_franchise(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedIdentity>,
    client: ClientInfo,
    ApiPath(id): ApiPath<i32>,
    ApiJson(request): ApiJson<UpdateFranchiseRequest>,
) -> Response {
    match FranchisesService::new(&state)
        .update(&actor, &client, id, request)
        .await
    {
        Ok(franchise) => response::success_with_message(franchise, "Franchise updated successfully"),
        Err(err) => failed(&client, "update_franchise_fail", err),
    }
}

/// 停业
pub async fn suspend_franchise(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthenticatedIdentity>,
    client: ClientInfo,
    ApiPath(id): ApiPath<i32>,
) -> Response {
    match FranchisesService::new(&state).suspend(&actor, &client, id).await {
        Ok(()) => response::success_with_message(
            json!({ "id": id }),
            "Franchise suspended successfully",
        ),
        Err(err) => failed(&client, "suspend_franchise_fail", err),
    }
}

/// 启用中的加盟店下拉选项
pub async fn franchise_options(State(state): State<AppState>, client: ClientInfo) -> Response {
    match FranchisesService::new(&state).active_options().await {
        Ok(options) => response::success(options),
        Err(err) => failed(&client, "franchise_options_fail", err),
    }
}
