//! # Entity 模块
//!
//! 包含所有 Sea-ORM 实体定义

pub mod attendance;
pub mod audit_logs;
pub mod franchises;
pub mod roles;
pub mod user_sessions;
pub mod users;

pub use attendance::Entity as Attendance;
pub use audit_logs::Entity as AuditLogs;
pub use franchises::Entity as Franchises;
pub use roles::Entity as Roles;
pub use user_sessions::Entity as UserSessions;
pub use users::Entity as Users;
