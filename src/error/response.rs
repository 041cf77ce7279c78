//! # 错误响应转换
//!
//! 所有错误统一输出为 `{"error": "<message>"}`

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use super::{AppError, ErrorCategory};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, lerror};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.to_http_response_parts();

        match self.category() {
            ErrorCategory::Server => lerror!(
                "system",
                LogStage::Error,
                LogComponent::Http,
                "request_failed",
                &format!("{self:?}"),
                code = code,
                status = status.as_u16()
            ),
            ErrorCategory::Client => ldebug!(
                "system",
                LogStage::Response,
                LogComponent::Http,
                "request_rejected",
                &self.to_string(),
                code = code,
                status = status.as_u16()
            ),
        }

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}
