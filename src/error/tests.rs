//! # 错误处理测试

use crate::error::{AppError, ErrorCategory, is_unique_violation};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use std::error::Error;

#[test]
fn test_config_error_creation() {
    let err = AppError::config("缺少数据库URL");
    assert!(matches!(err, AppError::Config { .. }));
    assert_eq!(err.to_string(), "配置错误: 缺少数据库URL");
}

#[test]
fn test_config_error_with_source() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "文件不存在");
    let err = AppError::config_with_source("配置文件加载失败", io_err);

    assert!(err.to_string().contains("配置错误: 配置文件加载失败"));
    assert!(err.source().is_some());
}

#[test]
fn test_auto_conversion_from_toml_error() {
    let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
    let err: AppError = toml_err.into();

    assert!(matches!(err, AppError::Config { .. }));
    assert!(err.to_string().contains("TOML解析失败"));
}

#[test]
fn test_auth_errors_map_to_expected_status() {
    assert_eq!(
        AppError::unauthorized().to_http_response_parts().0,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        AppError::forbidden().to_http_response_parts().0,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        AppError::InvalidCredentials.to_http_response_parts().0,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        AppError::AccountDisabled.to_http_response_parts().0,
        StatusCode::FORBIDDEN
    );
}

#[test]
fn test_client_message_hides_server_details() {
    let err = AppError::database("connection pool exhausted at 10.0.0.3");
    assert_eq!(err.client_message(), "Internal server error");
    assert_eq!(err.category(), ErrorCategory::Server);

    let err = AppError::not_found("User", "42");
    assert_eq!(err.client_message(), "User not found");
    assert_eq!(err.category(), ErrorCategory::Client);
}

#[test]
fn test_invalid_credentials_message_is_generic() {
    assert_eq!(
        AppError::InvalidCredentials.client_message(),
        "Invalid email or password"
    );
}

#[test]
fn test_unique_violation_detection_ignores_other_errors() {
    let err = sea_orm::DbErr::Custom("boom".to_string());
    assert!(!is_unique_violation(&err));
}

#[tokio::test]
async fn test_into_response_body_shape() {
    let response = AppError::forbidden().into_response();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body,
        serde_json::json!({ "error": "Forbidden: Insufficient permissions" })
    );
}
