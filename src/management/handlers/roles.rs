//! 角色处理器

use axum::extract::State;
use axum::response::Response;

use crate::management::response;
use crate::management::server::AppState;
use crate::management::services::roles::list_roles;

/// 全部角色
pub async fn get_roles(State(state): State<AppState>) -> Response {
    match list_roles(&state.db).await {
        Ok(roles) => response::success(roles),
        Err(err) => response::app_error(err),
    }
}
