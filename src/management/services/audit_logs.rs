//! # 审计日志查询服务
//!
//! 审计表只追加，这里只提供分页浏览。

use chrono::NaiveDateTime;
use entity::audit_logs;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::shared::{PaginationParams, build_page};
use crate::error::{Context, Result};
use crate::management::response::Pagination;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub user_id: Option<i32>,
    pub module: Option<String>,
    pub action: Option<String>,
}

/// 审计记录响应，`details` 解析为 JSON
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogResponse {
    pub id: i32,
    pub user_id: i32,
    pub action: String,
    pub module: String,
    pub record_id: Option<String>,
    pub details: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: NaiveDateTime,
}

impl From<audit_logs::Model> for AuditLogResponse {
    fn from(log: audit_logs::Model) -> Self {
        let details = log.details.as_deref().map(|raw| {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
        });
        Self {
            id: log.id,
            user_id: log.user_id,
            action: log.action,
            module: log.module,
            record_id: log.record_id,
            details,
            ip_address: log.ip_address,
            user_agent: log.user_agent,
            timestamp: log.timestamp,
        }
    }
}

#[derive(Debug)]
pub struct ListAuditLogsResult {
    pub logs: Vec<AuditLogResponse>,
    pub pagination: Pagination,
}

/// 分页查询审计日志，按时间倒序
pub async fn list_audit_logs(
    db: &DatabaseConnection,
    query: &AuditLogQuery,
) -> Result<ListAuditLogsResult> {
    let params = PaginationParams::new(query.page, query.limit, 20, 100);

    let mut select = audit_logs::Entity::find();
    if let Some(user_id) = query.user_id {
        select = select.filter(audit_logs::Column::UserId.eq(user_id));
    }
    if let Some(module) = query.module.as_deref().filter(|s| !s.is_empty()) {
        select = select.filter(audit_logs::Column::Module.eq(module));
    }
    if let Some(action) = query.action.as_deref().filter(|s| !s.is_empty()) {
        select = select.filter(audit_logs::Column::Action.eq(action));
    }

    let total = select
        .clone()
        .count(db)
        .await
        .context("Failed to count audit logs")?;

    let logs = select
        .order_by_desc(audit_logs::Column::Timestamp)
        .order_by_desc(audit_logs::Column::Id)
        .offset(params.offset())
        .limit(params.limit)
        .all(db)
        .await
        .context("Failed to fetch audit logs")?
        .into_iter()
        .map(AuditLogResponse::from)
        .collect();

    Ok(ListAuditLogsResult {
        logs,
        pagination: build_page(total, params).into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn log(details: Option<&str>) -> audit_logs::Model {
        audit_logs::Model {
            id: 1,
            user_id: 2,
            action: "login".to_string(),
            module: "authentication".to_string(),
            record_id: None,
            details: details.map(str::to_string),
            ip_address: None,
            user_agent: None,
            timestamp: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_details_parsed_as_json() {
        let response = AuditLogResponse::from(log(Some(r#"{"loginMethod":"password"}"#)));
        assert_eq!(response.details, Some(json!({"loginMethod": "password"})));
    }

    #[test]
    fn test_details_fallback_to_string() {
        let response = AuditLogResponse::from(log(Some("plain")));
        assert_eq!(response.details, Some(json!("plain")));
        assert_eq!(AuditLogResponse::from(log(None)).details, None);
    }
}
