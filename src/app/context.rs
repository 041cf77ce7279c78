//! 应用上下文
//!
//! 统一持有跨模块共享的服务实例，由启动流程构造一次后传入路由和后台任务。

use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::auth::{AuditSink, AuthGate, SessionResolver, SessionStore, SessionSweepTask};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub db: Arc<DatabaseConnection>,
    pub sessions: Arc<SessionStore>,
    pub resolver: Arc<SessionResolver>,
    pub gate: AuthGate,
    pub audit: Arc<AuditSink>,
}

impl AppContext {
    /// 根据配置和数据库连接组装全部服务
    #[must_use]
    pub fn new(config: Arc<AppConfig>, db: Arc<DatabaseConnection>) -> Self {
        let sessions = Arc::new(SessionStore::new(
            Arc::clone(&db),
            config.auth.session_ttl(),
        ));
        let resolver = Arc::new(SessionResolver::new(
            Arc::clone(&db),
            Arc::clone(&sessions),
            config.auth.cookie_name.clone(),
        ));
        let gate = AuthGate::new(Arc::clone(&resolver));
        let audit = Arc::new(AuditSink::new(Arc::clone(&db)));

        Self {
            config,
            db,
            sessions,
            resolver,
            gate,
            audit,
        }
    }

    /// 过期会话清理任务
    #[must_use]
    pub fn session_sweeper(&self) -> SessionSweepTask {
        SessionSweepTask::new(
            Arc::clone(&self.sessions),
            Duration::from_secs(self.config.auth.session_sweep_interval_secs.max(1)),
        )
    }
}
