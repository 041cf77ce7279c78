//! # 考勤处理器

use axum::extract::State;
use axum::response::Response;

use super::extract::{ApiPath, ApiQuery};
use crate::lerror;
use crate::logging::{LogComponent, LogStage};
use crate::management::middleware::ClientInfo;
use crate::management::response;
use crate::management::server::AppState;
use crate::management::services::AttendanceService;
use crate::management::services::attendance::{AttendanceHistoryQuery, AttendanceListQuery};

/// 考勤列表
pub async fn list_attendance(
    State(state): State<AppState>,
    client: ClientInfo,
    ApiQuery(query): ApiQuery<AttendanceListQuery>,
) -> Response {
    match AttendanceService::new(&state).list(&query).await {
        Ok(result) => response::paginated(result.records, result.pagination),
        Err(err) => {
            lerror!(
                &client.request_id,
                LogStage::Internal,
                LogComponent::Attendance,
                "list_attendance_fail",
                &format!("{err:?}")
            );
            response::app_error(err)
        }
    }
}

/// 单个用户的考勤历史
pub async fn user_attendance(
    State(state): State<AppState>,
    client: ClientInfo,
    ApiPath(user_id): ApiPath<i32>,
    ApiQuery(query): ApiQuery<AttendanceHistoryQuery>,
) -> Response {
    match AttendanceService::new(&state).history(user_id, &query).await {
        Ok(history) => response::success(history),
        Err(err) => {
            lerror!(
                &client.request_id,
                LogStage::Internal,
                LogComponent::Attendance,
                "user_attendance_fail",
                &format!("{err:?}")
            );
            response::app_error(err)
        }
    }
}
