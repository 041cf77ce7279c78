//! 审计日志处理器

use axum::extract::State;
use axum::response::Response;

use super::extract::ApiQuery;
use crate::management::response;
use crate::management::server::AppState;
use crate::management::services::audit_logs::{AuditLogQuery, list_audit_logs};

/// 审计日志分页查询
pub async fn get_audit_logs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AuditLogQuery>,
) -> Response {
    match list_audit_logs(&state.db, &query).await {
        Ok(result) => response::paginated(result.logs, result.pagination),
        Err(err) => response::app_error(err),
    }
}
