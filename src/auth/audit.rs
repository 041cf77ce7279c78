//! # 审计日志
//!
//! 只追加。写入失败会记录到运行日志并返回 `Err`，由调用方显式丢弃。

use std::sync::Arc;

use chrono::Utc;
use entity::audit_logs;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::{Value, json};

use crate::error::{Context, Result};
use crate::lerror;
use crate::logging::{LogComponent, LogStage};

/// 认证模块名
pub const MODULE_AUTHENTICATION: &str = "authentication";
pub const ACTION_LOGIN: &str = "login";
pub const ACTION_LOGOUT: &str = "logout";

/// 一条审计记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub user_id: i32,
    pub action: String,
    pub module: String,
    pub record_id: Option<String>,
    pub details: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditEntry {
    #[must_use]
    pub fn new(user_id: i32, action: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            user_id,
            action: action.into(),
            module: module.into(),
            record_id: None,
            details: None,
            ip_address: None,
            user_agent: None,
        }
    }

    #[must_use]
    pub fn record_id(mut self, record_id: impl ToString) -> Self {
        self.record_id = Some(record_id.to_string());
        self
    }

    #[must_use]
    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    #[must_use]
    pub fn ip_address(mut self, ip: Option<&str>) -> Self {
        self.ip_address = ip.map(ToString::to_string);
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: Option<&str>) -> Self {
        self.user_agent = user_agent.map(ToString::to_string);
        self
    }
}

/// 审计日志写入器
pub struct AuditSink {
    db: Arc<DatabaseConnection>,
}

impl AuditSink {
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 追加一条记录
    pub async fn record(&self, entry: AuditEntry) -> Result<()> {
        let action = entry.action.clone();
        let module = entry.module.clone();

        let result = audit_logs::ActiveModel {
            user_id: Set(entry.user_id),
            action: Set(entry.action),
            module: Set(entry.module),
            record_id: Set(entry.record_id),
            details: Set(entry.details.map(|d| d.to_string())),
            ip_address: Set(entry.ip_address),
            user_agent: Set(entry.user_agent),
            timestamp: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .context("Failed to write audit log");

        if let Err(err) = &result {
            lerror!(
                "system",
                LogStage::Db,
                LogComponent::Audit,
                "audit_write_fail",
                &format!("Failed to record audit event {module}/{action}: {err:?}")
            );
        }

        result.map(|_| ())
    }

    /// 登录事件
    pub async fn record_login(
        &self,
        user_id: i32,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<()> {
        self.record(
            AuditEntry::new(user_id, ACTION_LOGIN, MODULE_AUTHENTICATION)
                .details(json!({ "loginMethod": "password" }))
                .ip_address(ip_address)
                .user_agent(user_agent),
        )
        .await
    }

    /// 登出事件
    pub async fn record_logout(&self, user_id: i32, ip_address: Option<&str>) -> Result<()> {
        self.record(
            AuditEntry::new(user_id, ACTION_LOGOUT, MODULE_AUTHENTICATION).ip_address(ip_address),
        )
        .await
    }
}
