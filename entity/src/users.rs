//! # 用户实体定义
//!
//! 员工账户表的 Sea-ORM 实体模型，总部与加盟店员工共用

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 用户实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 员工编号，如 HO001 / FR001
    #[sea_orm(unique)]
    pub emp_id: String,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub phone: String,
    /// 为空时无法登录
    pub password_hash: Option<String>,
    pub role_id: i32,
    pub franchise_id: Option<i32>,
    /// `ho` 或 `franchise`
    pub location_type: String,
    pub base_salary: Option<f64>,
    pub salary_effective_from: Option<Date>,
    /// `active` 或 `inactive`
    pub status: String,
    pub created_by: Option<i32>,
    pub last_login: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::roles::Entity",
        from = "Column::RoleId",
        to = "super::roles::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Role,
    #[sea_orm(
        belongs_to = "super::franchises::Entity",
        from = "Column::FranchiseId",
        to = "super::franchises::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Franchise,
    #[sea_orm(has_many = "super::user_sessions::Entity")]
    UserSessions,
    #[sea_orm(has_many = "super::attendance::Entity")]
    Attendance,
}

impl Related<super::roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl Related<super::franchises::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Franchise.def()
    }
}

impl Related<super::user_sessions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserSessions.def()
    }
}

impl Related<super::attendance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendance.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
