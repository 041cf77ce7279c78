//! # API 响应结构
//!
//! 管理接口的统一成功响应格式。错误响应由 `AppError` 自身转换。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// # 分页信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

/// # 标准成功响应
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// # 分页成功响应
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// # API响应枚举
#[derive(Debug)]
pub enum ApiResponse<T: Serialize> {
    Success(T),
    SuccessWithMessage(T, String),
    Created(T, String),
    Paginated(Vec<T>, Pagination),
}

impl<T: Serialize> ApiResponse<T> {
    fn envelope(status: StatusCode, data: T, message: String) -> Response {
        (
            status,
            Json(SuccessResponse {
                success: true,
                data: Some(data),
                message: Some(message),
                timestamp: Utc::now(),
            }),
        )
            .into_response()
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            Self::Success(data) => Self::envelope(StatusCode::OK, data, "OK".to_string()),
            Self::SuccessWithMessage(data, message) => {
                Self::envelope(StatusCode::OK, data, message)
            }
            Self::Created(data, message) => Self::envelope(StatusCode::CREATED, data, message),
            Self::Paginated(data, pagination) => (
                StatusCode::OK,
                Json(PaginatedResponse {
                    success: true,
                    data,
                    pagination,
                    message: None,
                    timestamp: Utc::now(),
                }),
            )
                .into_response(),
        }
    }
}

/// # 便捷函数：成功响应
pub fn success<T: Serialize>(data: T) -> Response {
    ApiResponse::Success(data).into_response()
}

/// # 便捷函数：带消息的成功响应
pub fn success_with_message<T: Serialize>(data: T, message: &str) -> Response {
    ApiResponse::SuccessWithMessage(data, message.to_string()).into_response()
}

/// # 便捷函数：201 创建响应
pub fn created<T: Serialize>(data: T, message: &str) -> Response {
    ApiResponse::Created(data, message.to_string()).into_response()
}

/// # 便捷函数：分页响应
pub fn paginated<T: Serialize>(data: Vec<T>, pagination: Pagination) -> Response {
    ApiResponse::Paginated(data, pagination).into_response()
}

/// # 便捷函数：应用错误响应
pub fn app_error(error: AppError) -> Response {
    error.into_response()
}
