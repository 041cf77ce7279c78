//! # 管理端服务层
//!
//! 聚合各管理域的业务逻辑，供 HTTP handler、种子命令与测试复用。

pub mod attendance;
pub mod audit_logs;
pub mod auth;
pub mod franchises;
pub mod roles;
pub mod shared;
pub mod users;

pub use attendance::AttendanceService;
pub use auth::AuthManagementService;
pub use franchises::FranchisesService;
pub use users::UsersService;

pub use shared::{PaginationInfo, PaginationParams, SortOrder, build_page};
