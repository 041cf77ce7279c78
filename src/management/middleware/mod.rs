//! # 管理服务器中间件

pub mod auth;
pub mod client_info;
pub mod request_id;

pub use auth::{PermissionGuard, require_permission};
pub use client_info::{ClientInfo, get_real_client_ip};
pub use request_id::{RequestId, request_id_middleware};
