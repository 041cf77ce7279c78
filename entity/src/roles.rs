//! # 角色实体定义
//!
//! 角色与权限矩阵表，权限以 JSON 对象形式保存

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 角色实体
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 角色标识，如 `hr-manager`
    #[sea_orm(unique)]
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub is_system_role: bool,
    /// 权限 JSON 字符串，键为 `canManageUsers` 等
    #[sea_orm(column_type = "Text")]
    pub permissions: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::users::Entity")]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
