//! # 认证授权模块
//!
//! 会话令牌、密码哈希、会话存储与解析、权限模型、授权门以及审计日志。

pub mod audit;
pub mod cookie;
pub mod gate;
pub mod password;
pub mod permissions;
pub mod resolver;
pub mod session_store;
pub mod session_sweeper;
pub mod token;
pub mod types;

pub use audit::{AuditEntry, AuditSink};
pub use gate::{AuthGate, GateError};
pub use permissions::{PermissionKey, PermissionSet, has_permission};
pub use resolver::{SessionResolution, SessionResolver};
pub use session_store::{IssuedSession, SessionStore};
pub use session_sweeper::SessionSweepTask;
pub use types::{AuthenticatedIdentity, LocationType, UserStatus};
