//! # HTTP 处理器

pub mod attendance;
pub mod audit_logs;
pub mod auth;
pub mod extract;
pub mod franchises;
pub mod roles;
pub mod system;
pub mod users;
