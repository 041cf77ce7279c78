//! # 审计日志实体定义
//!
//! 只追加的安全审计记录表

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 审计日志实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub action: String,
    pub module: String,
    pub record_id: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub details: Option<String>, // JSON 字符串
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
