//! # 日志配置模块
//!
//! 基于 `tracing` 的结构化日志：统一的订阅器初始化，以及带阶段/组件字段的日志宏

use std::env;
use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 日志所处的处理阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    Startup,
    Shutdown,
    Configuration,
    Db,
    Authentication,
    Authorization,
    RequestStart,
    Response,
    BackgroundTask,
    Internal,
    Error,
}

impl LogStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::Configuration => "configuration",
            Self::Db => "db",
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::RequestStart => "request_start",
            Self::Response => "response",
            Self::BackgroundTask => "background_task",
            Self::Internal => "internal",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 产生日志的组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    Main,
    Config,
    Database,
    ServerSetup,
    Http,
    Auth,
    Session,
    Permission,
    Audit,
    Attendance,
    Users,
    Franchises,
    Seed,
    SessionSweeper,
}

impl LogComponent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Config => "config",
            Self::Database => "database",
            Self::ServerSetup => "server_setup",
            Self::Http => "http",
            Self::Auth => "auth",
            Self::Session => "session",
            Self::Permission => "permission",
            Self::Audit => "audit",
            Self::Attendance => "attendance",
            Self::Users => "users",
            Self::Franchises => "franchises",
            Self::Seed => "seed",
            Self::SessionSweeper => "session_sweeper",
        }
    }
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 结构化 info 日志
///
/// `linfo!(request_id, stage, component, operation, message, extra_field = value, ...)`
#[macro_export]
macro_rules! linfo {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($fields:tt)+)?) => {
        ::tracing::info!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $message
        )
    };
}

/// 结构化 warn 日志
#[macro_export]
macro_rules! lwarn {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($fields:tt)+)?) => {
        ::tracing::warn!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $message
        )
    };
}

/// 结构化 error 日志
#[macro_export]
macro_rules! lerror {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($fields:tt)+)?) => {
        ::tracing::error!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $message
        )
    };
}

/// 结构化 debug 日志
#[macro_export]
macro_rules! ldebug {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $($fields:tt)+)?) => {
        ::tracing::debug!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($($fields)+,)?
            "{}",
            $message
        )
    };
}

/// 默认过滤规则：关闭 SQL 语句级日志
#[must_use]
pub fn default_filter(level: &str) -> String {
    format!("{level},franchise_office=debug,sqlx::query=off,sea_orm::query=warn,sqlx=warn")
}

/// 初始化日志系统
///
/// `RUST_LOG` 优先于配置文件中的级别。重复调用时静默忽略。
pub fn init_logging(log_level: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| default_filter(level));

    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_new(&log_filter).unwrap_or_else(|_| EnvFilter::new(default_filter("info"))))
        .with(
            tracing_fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();

    if result.is_ok() {
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "logging_ready",
            &format!("Logging initialised with filter `{log_filter}`")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_silences_sql() {
        let filter = default_filter("warn");
        assert!(filter.starts_with("warn,"));
        assert!(filter.contains("sqlx::query=off"));
    }

    #[test]
    fn test_stage_and_component_display() {
        assert_eq!(LogStage::Authentication.to_string(), "authentication");
        assert_eq!(LogComponent::SessionSweeper.to_string(), "session_sweeper");
    }

    #[test]
    fn test_macros_accept_extra_fields() {
        // 未安装订阅器时宏仍可展开执行
        linfo!("req-1", LogStage::Internal, LogComponent::Main, "op", "message");
        lwarn!(
            "req-2",
            LogStage::Internal,
            LogComponent::Main,
            "op",
            "message",
            user_id = 7
        );
    }
}
