//! # 初始数据
//!
//! 内置角色与首个超级管理员账户。两者都可重复执行。

use std::env;

use chrono::Utc;
use entity::{roles, users};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::auth::password::hash_password;
use crate::auth::{LocationType, PermissionKey, PermissionSet, UserStatus};
use crate::error::{AppError, Context, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{linfo, lwarn};

/// 超级管理员角色标识
pub const SUPERADMIN_ROLE: &str = "superadmin";

/// 内置角色定义
#[derive(Debug, Clone)]
pub struct SystemRole {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub permissions: PermissionSet,
}

/// 五个内置角色
#[must_use]
pub fn system_roles() -> Vec<SystemRole> {
    use PermissionKey as P;

    vec![
        SystemRole {
            name: SUPERADMIN_ROLE,
            display_name: "Super Admin",
            description: "Full access to every module",
            permissions: PermissionSet::all(),
        },
        SystemRole {
            name: "hr-manager",
            display_name: "HR Manager",
            description: "Manages employees, attendance and salary",
            permissions: PermissionSet::from_granted(&[
                P::ViewDashboard,
                P::ManageUsers,
                P::ViewAllFranchises,
                P::ProcessSalary,
                P::ViewReports,
                P::ExportReports,
                P::ViewAuditLogs,
            ]),
        },
        SystemRole {
            name: "franchise-owner",
            display_name: "Franchise Owner",
            description: "Runs a single franchise location",
            permissions: PermissionSet::from_granted(&[
                P::ViewDashboard,
                P::ManageInventory,
                P::ManageExpenses,
                P::UploadCashDeposit,
                P::ManageFranchiseLeads,
                P::CreateFranchiseDeals,
                P::UploadDocuments,
                P::CreateTickets,
            ]),
        },
        SystemRole {
            name: "finance-manager",
            display_name: "Finance Manager",
            description: "Handles invoices, deposits and expense approval",
            permissions: PermissionSet::from_granted(&[
                P::ViewDashboard,
                P::ManageFinance,
                P::AssignLoanOptions,
                P::UploadDueLetters,
                P::GenerateInvoices,
                P::VerifyCashDeposits,
                P::ApproveExpenses,
                P::VerifyFranchisePayments,
                P::ViewReports,
                P::ExportReports,
            ]),
        },
        SystemRole {
            name: "sales-agent",
            display_name: "Sales Agent",
            description: "Creates and follows up own leads",
            permissions: PermissionSet::from_granted(&[
                P::ViewDashboard,
                P::CreateLeads,
                P::ViewOwnLeads,
                P::UploadDocuments,
                P::SelectLoanOption,
                P::CreateTickets,
            ]),
        },
    ]
}

/// 插入或更新内置角色
///
/// 已存在且标记为系统角色的记录会覆盖权限、显示名与描述，其它角色保持不变。
pub async fn ensure_system_roles(db: &DatabaseConnection) -> Result<()> {
    let now = Utc::now().naive_utc();

    for role in system_roles() {
        let existing = roles::Entity::find()
            .filter(roles::Column::Name.eq(role.name))
            .one(db)
            .await
            .context("Failed to look up role")?;

        match existing {
            Some(model) if model.is_system_role => {
                let mut active: roles::ActiveModel = model.into();
                active.display_name = Set(role.display_name.to_string());
                active.description = Set(Some(role.description.to_string()));
                active.permissions = Set(role.permissions.to_json_string());
                active.updated_at = Set(now);
                active.update(db).await.context("Failed to update role")?;
                linfo!(
                    "system",
                    LogStage::Db,
                    LogComponent::Seed,
                    "role_updated",
                    &format!("Updated role: {}", role.name)
                );
            }
            Some(_) => {
                lwarn!(
                    "system",
                    LogStage::Db,
                    LogComponent::Seed,
                    "role_skipped",
                    &format!("Role {} exists as a custom role, left untouched", role.name)
                );
            }
            None => {
                roles::ActiveModel {
                    name: Set(role.name.to_string()),
                    display_name: Set(role.display_name.to_string()),
                    description: Set(Some(role.description.to_string())),
                    is_system_role: Set(true),
                    permissions: Set(role.permissions.to_json_string()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(db)
                .await
                .context("Failed to create role")?;
                linfo!(
                    "system",
                    LogStage::Db,
                    LogComponent::Seed,
                    "role_created",
                    &format!("Created role: {}", role.name)
                );
            }
        }
    }

    Ok(())
}

/// 首个管理员账户参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
    pub name: String,
    pub emp_id: String,
    pub phone: String,
}

impl AdminSeed {
    /// 从 `ADMIN_*` 环境变量读取，缺省时使用开发默认值
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 按给定查找函数读取，空值视为未设置
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            email: get("ADMIN_EMAIL", "admin@rummi.com").trim().to_lowercase(),
            password: get("ADMIN_PASSWORD", "admin123"),
            name: get("ADMIN_NAME", "Admin User"),
            emp_id: get("ADMIN_EMP_ID", "ADMIN001"),
            phone: get("ADMIN_PHONE", "1234567890"),
        }
    }
}

/// 创建超级管理员，邮箱已存在时跳过
///
/// 返回 `true` 表示新建了账户。
pub async fn ensure_admin_user(
    db: &DatabaseConnection,
    seed: &AdminSeed,
    bcrypt_cost: u32,
) -> Result<bool> {
    let existing = users::Entity::find()
        .filter(users::Column::Email.eq(seed.email.as_str()))
        .one(db)
        .await
        .context("Failed to look up admin user")?;
    if existing.is_some() {
        linfo!(
            "system",
            LogStage::Db,
            LogComponent::Seed,
            "admin_exists",
            &format!("Admin user {} already exists", seed.email)
        );
        return Ok(false);
    }

    let role = roles::Entity::find()
        .filter(roles::Column::Name.eq(SUPERADMIN_ROLE))
        .one(db)
        .await
        .context("Failed to look up superadmin role")?
        .ok_or_else(|| AppError::business("Superadmin role not found. Run `seed` first."))?;

    let password_hash = hash_password(&seed.password, bcrypt_cost)?;
    let now = Utc::now().naive_utc();

    let admin = users::ActiveModel {
        emp_id: Set(seed.emp_id.clone()),
        name: Set(seed.name.clone()),
        email: Set(seed.email.clone()),
        phone: Set(seed.phone.clone()),
        password_hash: Set(Some(password_hash)),
        role_id: Set(role.id),
        franchise_id: Set(None),
        location_type: Set(LocationType::Ho.as_str().to_string()),
        base_salary: Set(None),
        salary_effective_from: Set(None),
        status: Set(UserStatus::Active.as_str().to_string()),
        created_by: Set(None),
        last_login: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .context("Failed to create admin user")?;

    // 首个管理员由自己创建
    let admin_id = admin.id;
    let mut active: users::ActiveModel = admin.into();
    active.created_by = Set(Some(admin_id));
    active.update(db).await.context("Failed to update admin user")?;

    linfo!(
        "system",
        LogStage::Db,
        LogComponent::Seed,
        "admin_created",
        &format!("Created admin user {} ({})", seed.email, seed.emp_id)
    );
    Ok(true)
}
