//! # 请求提取器
//!
//! 包装 axum 的 `Json` / `Query` / `Path`，解析失败时返回统一的 `{"error": ...}` 响应。

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::Json;

use crate::error::AppError;
use crate::ldebug;
use crate::logging::{LogComponent, LogStage};

/// 请求体格式错误提示
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body";

fn rejected(kind: &str, detail: &str, message: &str) -> AppError {
    ldebug!(
        "system",
        LogStage::RequestStart,
        LogComponent::Http,
        "extract_rejected",
        &format!("Rejected {kind}: {detail}")
    );
    AppError::validation(message)
}

/// JSON 请求体
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejected("body", &rejection.body_text(), INVALID_BODY_MESSAGE)),
        }
    }
}

/// 查询字符串
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejected(
                "query",
                &rejection.body_text(),
                "Invalid query parameters",
            )),
        }
    }
}

/// 路径参数
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejected("path", &rejection.body_text(), "Invalid path parameter")),
        }
    }
}
