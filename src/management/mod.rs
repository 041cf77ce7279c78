//! # 管理API模块
//!
//! 会话认证、权限中间件与业务 REST 接口

pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod services;

pub use routes::create_routes;
pub use server::{AppState, ManagementServer, build_router};
