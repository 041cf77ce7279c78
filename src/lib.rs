//! # Franchise Office
//!
//! 加盟与人事后台核心库：会话 Cookie 认证、角色权限矩阵、审计日志，
//! 以及受权限保护的用户、加盟店与考勤管理接口。

pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod management;
pub mod seed;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, Result};
