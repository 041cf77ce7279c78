//! 角色查询服务

use entity::roles;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use serde::Serialize;

use crate::auth::PermissionSet;
use crate::error::{Context, Result};

/// 角色下拉项
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub id: i32,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub is_system_role: bool,
    pub permissions: PermissionSet,
}

impl From<roles::Model> for RoleResponse {
    fn from(role: roles::Model) -> Self {
        // 损坏的权限 JSON 按全部未授予处理
        let permissions = PermissionSet::from_json_str(&role.permissions).unwrap_or_default();
        Self {
            id: role.id,
            name: role.name,
            display_name: role.display_name,
            description: role.description,
            is_system_role: role.is_system_role,
            permissions,
        }
    }
}

/// 全部角色，按名称排序
pub async fn list_roles(db: &DatabaseConnection) -> Result<Vec<RoleResponse>> {
    Ok(roles::Entity::find()
        .order_by_asc(roles::Column::Name)
        .all(db)
        .await
        .context("Failed to fetch roles")?
        .into_iter()
        .map(RoleResponse::from)
        .collect())
}
