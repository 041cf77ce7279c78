//! # 加盟店实体定义

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 加盟店实体
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "franchises")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 加盟店编号，如 FR0001
    #[sea_orm(unique)]
    pub franchise_code: String,
    pub name: String,
    /// `A` / `B` / `C`
    pub deal_type: String,
    pub owner_id: i32,
    #[sea_orm(column_type = "Text")]
    pub address: String, // JSON 字符串
    #[sea_orm(column_type = "Text")]
    pub commission_structure: String, // JSON 字符串
    /// `active` 或 `suspended`
    pub status: String,
    pub activated_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Owner,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
