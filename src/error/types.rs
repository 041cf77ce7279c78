//! # 错误类型定义

use axum::http::StatusCode;
use thiserror::Error;

/// 登录失败时的统一提示，不区分账号是否存在
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";
/// 账户停用提示
pub const ACCOUNT_DISABLED_MESSAGE: &str = "Account is disabled. Please contact HR.";
/// 未认证提示
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";
/// 权限不足提示
pub const FORBIDDEN_MESSAGE: &str = "Forbidden: Insufficient permissions";

/// 应用主要错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 数据库相关错误
    #[error("数据库错误: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 没有有效会话
    #[error("认证错误: {message}")]
    Unauthorized { message: String },

    /// 会话有效但权限不足
    #[error("权限错误: {message}")]
    Forbidden { message: String },

    /// 登录凭据错误
    #[error("登录失败: {INVALID_CREDENTIALS_MESSAGE}")]
    InvalidCredentials,

    /// 账户已停用
    #[error("登录失败: {ACCOUNT_DISABLED_MESSAGE}")]
    AccountDisabled,

    /// 请求参数校验失败
    #[error("验证错误: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// 资源未找到
    #[error("资源未找到: {resource_type} {identifier}")]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    /// 资源冲突
    #[error("资源冲突: {resource_type} {identifier}")]
    Conflict {
        resource_type: String,
        identifier: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 业务逻辑错误
    #[error("业务错误: {message}")]
    Business { message: String },

    /// 系统内部错误
    #[error("内部错误: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// IO相关错误
    #[error("IO错误: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// 将错误转换为HTTP状态码和错误代码
    #[must_use]
    pub const fn to_http_response_parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Config { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Self::Database { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            Self::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            Self::AccountDisabled => (StatusCode::FORBIDDEN, "ACCOUNT_DISABLED"),
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND"),
            Self::Conflict { .. } => (StatusCode::CONFLICT, "RESOURCE_CONFLICT"),
            Self::Business { .. } => (StatusCode::BAD_REQUEST, "BUSINESS_ERROR"),
            Self::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Io { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            Self::Serialization { .. } => (StatusCode::BAD_REQUEST, "SERIALIZATION_ERROR"),
        }
    }

    /// 返回给客户端的消息，服务端错误不暴露内部细节
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::Validation { message, .. }
            | Self::Business { message } => message.clone(),
            Self::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE.to_string(),
            Self::AccountDisabled => ACCOUNT_DISABLED_MESSAGE.to_string(),
            Self::NotFound { resource_type, .. } => format!("{resource_type} not found"),
            Self::Conflict {
                resource_type,
                identifier,
                ..
            } => format!("{resource_type} {identifier} already exists"),
            Self::Serialization { .. } => "Invalid request body".to_string(),
            Self::Config { .. }
            | Self::Database { .. }
            | Self::Internal { .. }
            | Self::Io { .. } => "Internal server error".to_string(),
        }
    }

    /// 错误归类
    #[must_use]
    pub fn category(&self) -> super::ErrorCategory {
        if self.to_http_response_parts().0.is_server_error() {
            super::ErrorCategory::Server
        } else {
            super::ErrorCategory::Client
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建数据库错误
    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的数据库错误
    pub fn database_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Database {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建未认证错误
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::Unauthorized {
            message: UNAUTHORIZED_MESSAGE.to_string(),
        }
    }

    /// 创建权限不足错误
    #[must_use]
    pub fn forbidden() -> Self {
        Self::Forbidden {
            message: FORBIDDEN_MESSAGE.to_string(),
        }
    }

    /// 创建校验错误
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// 创建带字段名的校验错误
    pub fn validation_field<T: Into<String>, F: Into<String>>(field: F, message: T) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// 创建资源未找到错误
    pub fn not_found<T: Into<String>, I: Into<String>>(resource_type: T, identifier: I) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
        }
    }

    /// 创建资源冲突错误
    pub fn conflict<T: Into<String>, I: Into<String>>(resource_type: T, identifier: I) -> Self {
        Self::Conflict {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
            source: None,
        }
    }

    /// 创建带来源的资源冲突错误
    pub fn conflict_with_source<T: Into<String>, I: Into<String>, E: Into<anyhow::Error>>(
        resource_type: T,
        identifier: I,
        source: E,
    ) -> Self {
        Self::Conflict {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
            source: Some(source.into()),
        }
    }

    /// 创建业务错误
    pub fn business<T: Into<String>>(message: T) -> Self {
        Self::Business {
            message: message.into(),
        }
    }

    /// 创建内部错误
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的内部错误
    pub fn internal_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

// 自动转换常见错误类型
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: "文件操作失败".to_string(),
            source: err,
        }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML解析失败", err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: "JSON处理失败".to_string(),
            source: err.into(),
        }
    }
}

impl From<sea_orm::error::DbErr> for AppError {
    fn from(err: sea_orm::error::DbErr) -> Self {
        Self::database_with_source("数据库操作失败", err)
    }
}

impl From<sea_orm::TransactionError<Self>> for AppError {
    fn from(err: sea_orm::TransactionError<Self>) -> Self {
        match err {
            sea_orm::TransactionError::Connection(db_err) => db_err.into(),
            sea_orm::TransactionError::Transaction(app_err) => app_err,
        }
    }
}

// Bcrypt错误转换
impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::internal_with_source("密码处理失败", err)
    }
}
