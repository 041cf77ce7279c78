//! # 用户管理服务
//!
//! 集中管理员工账户的查询、创建、更新、停用与密码重置，供 HTTP handler 复用。
//! 停用与重置密码会在同一事务内吊销该用户的全部会话。

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use entity::{franchises, roles, users};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::shared::codes::{EMP_ID_WIDTH, format_code, next_sequence};
use super::shared::validation::{
    normalize_email, parse_date, validate_length, validate_password, validate_phone,
    validate_positive,
};
use super::shared::{PaginationParams, SortOrder, build_page, record_audit};
use crate::app::AppContext;
use crate::auth::password::hash_password;
use crate::auth::{AuditEntry, AuthenticatedIdentity, LocationType, PermissionSet, SessionStore, UserStatus};
use crate::error::{AppError, Context, Result, is_unique_violation};
use crate::linfo;
use crate::logging::{LogComponent, LogStage};
use crate::management::middleware::ClientInfo;
use crate::management::response::Pagination;

/// 审计模块名
pub const AUDIT_MODULE: &str = "users";
/// 邮箱或手机号重复时的提示
pub const DUPLICATE_USER_MESSAGE: &str = "User with this email or phone already exists";

/// 用户列表查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub role_id: Option<i32>,
    pub location_type: Option<String>,
    pub franchise_id: Option<i32>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// 创建用户请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role_id: i32,
    pub location_type: String,
    pub franchise_id: Option<i32>,
    pub base_salary: f64,
    pub effective_from: String,
    pub password: String,
}

/// 更新用户请求（全部字段可选）
///
/// `franchiseId: null` 表示解除加盟店关联，缺省表示不变。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role_id: Option<i32>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub franchise_id: Option<Option<i32>>,
    pub base_salary: Option<f64>,
    pub effective_from: Option<String>,
    pub status: Option<String>,
}

/// 重置密码请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// 角色摘要
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSummary {
    pub id: i32,
    pub name: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionSet>,
}

/// 加盟店摘要
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FranchiseSummary {
    pub id: i32,
    pub name: String,
    pub franchise_code: String,
}

/// 用户响应（不含密码哈希）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub emp_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role_id: i32,
    pub role: Option<RoleSummary>,
    pub franchise_id: Option<i32>,
    pub franchise: Option<FranchiseSummary>,
    pub location_type: String,
    pub base_salary: Option<f64>,
    pub salary_effective_from: Option<NaiveDate>,
    pub status: String,
    pub created_by: Option<i32>,
    pub last_login: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl UserResponse {
    fn new(
        user: users::Model,
        role: Option<RoleSummary>,
        franchise: Option<FranchiseSummary>,
    ) -> Self {
        Self {
            id: user.id,
            emp_id: user.emp_id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role_id: user.role_id,
            role,
            franchise_id: user.franchise_id,
            franchise,
            location_type: user.location_type,
            base_salary: user.base_salary,
            salary_effective_from: user.salary_effective_from,
            status: user.status,
            created_by: user.created_by,
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug)]
pub struct ListUsersResult {
    pub users: Vec<UserResponse>,
    pub pagination: Pagination,
}

/// 用户服务
pub struct UsersService<'a> {
    ctx: &'a AppContext,
}

impl<'a> UsersService<'a> {
    #[must_use]
    pub const fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    fn db(&self) -> &'a DatabaseConnection {
        self.ctx.db.as_ref()
    }

    /// 分页列出用户
    pub async fn list(&self, query: &UserListQuery) -> Result<ListUsersResult> {
        let params = PaginationParams::new(query.page, query.limit, 10, 100);

        let total = Self::filtered_users(query)
            .count(self.db())
            .await
            .context("Failed to count users")?;

        let rows = Self::apply_sort(Self::filtered_users(query), query)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db())
            .await
            .context("Failed to fetch users")?;

        Ok(ListUsersResult {
            users: self.build_responses(rows).await?,
            pagination: build_page(total, params).into(),
        })
    }

    /// 用户详情（角色附带权限）
    pub async fn get(&self, id: i32) -> Result<UserResponse> {
        let user = Self::fetch_user(self.db(), id).await?;

        let role = roles::Entity::find_by_id(user.role_id)
            .one(self.db())
            .await
            .context("Failed to load role")?
            .map(|role| RoleSummary {
                permissions: PermissionSet::from_json_str(&role.permissions).ok(),
                id: role.id,
                name: role.name,
                display_name: role.display_name,
            });

        let franchise = match user.franchise_id {
            Some(franchise_id) => franchises::Entity::find_by_id(franchise_id)
                .one(self.db())
                .await
                .context("Failed to load franchise")?
                .map(franchise_summary),
            None => None,
        };

        Ok(UserResponse::new(user, role, franchise))
    }

    /// 创建用户，员工编号按地点类型自动生成
    pub async fn create(
        &self,
        actor: &AuthenticatedIdentity,
        client: &ClientInfo,
        request: CreateUserRequest,
    ) -> Result<UserResponse> {
        validate_length("name", &request.name, 2, 100)?;
        let email = normalize_email(&request.email)?;
        validate_phone(&request.phone)?;
        let location = LocationType::parse(&request.location_type).ok_or_else(|| {
            AppError::validation_field("locationType", "locationType must be 'ho' or 'franchise'")
        })?;
        validate_positive("baseSalary", request.base_salary)?;
        let effective_from = parse_date("effectiveFrom", &request.effective_from)?;
        validate_password(&request.password)?;

        let password_hash = hash_password(&request.password, self.ctx.config.auth.bcrypt_cost)?;

        let txn = self.db().begin().await.context("Failed to begin transaction")?;

        Self::ensure_unique_contact(&txn, Some(&email), Some(&request.phone), None).await?;
        Self::ensure_role_exists(&txn, request.role_id).await?;

        let franchise_id = match location {
            LocationType::Franchise => {
                let franchise_id = request.franchise_id.ok_or_else(|| {
                    AppError::validation_field(
                        "franchiseId",
                        "Franchise ID is required for franchise location",
                    )
                })?;
                Self::ensure_franchise_exists(&txn, franchise_id).await?;
                Some(franchise_id)
            }
            LocationType::Ho => match request.franchise_id {
                Some(franchise_id) => {
                    Self::ensure_franchise_exists(&txn, franchise_id).await?;
                    Some(franchise_id)
                }
                None => None,
            },
        };

        let emp_id = Self::next_emp_id(&txn, location).await?;
        let now = Utc::now().naive_utc();

        let user = users::ActiveModel {
            emp_id: Set(emp_id.clone()),
            name: Set(request.name.trim().to_string()),
            email: Set(email),
            phone: Set(request.phone),
            password_hash: Set(Some(password_hash)),
            role_id: Set(request.role_id),
            franchise_id: Set(franchise_id),
            location_type: Set(location.as_str().to_string()),
            base_salary: Set(Some(request.base_salary)),
            salary_effective_from: Set(Some(effective_from)),
            status: Set(UserStatus::Active.as_str().to_string()),
            created_by: Set(Some(actor.user_id)),
            last_login: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict_with_source("User", emp_id.clone(), e)
            } else {
                AppError::database_with_source("Failed to create user", e)
            }
        })?;

        txn.commit().await.context("Failed to commit user creation")?;

        linfo!(
            &client.request_id,
            LogStage::Internal,
            LogComponent::Users,
            "user_created",
            &format!("User {} ({}) created by {}", user.id, user.emp_id, actor.user_id)
        );

        record_audit(
            &self.ctx.audit,
            AuditEntry::new(actor.user_id, "create", AUDIT_MODULE)
                .record_id(user.id)
                .details(json!({ "empId": user.emp_id, "locationType": user.location_type }))
                .ip_address(client.ip())
                .user_agent(client.user_agent()),
        )
        .await;

        self.get(user.id).await
    }

    /// 部分更新用户
    ///
    /// 状态改为 `inactive` 时同时吊销会话。
    pub async fn update(
        &self,
        actor: &AuthenticatedIdentity,
        client: &ClientInfo,
        id: i32,
        request: UpdateUserRequest,
    ) -> Result<UserResponse> {
        if let Some(name) = &request.name {
            validate_length("name", name, 2, 100)?;
        }
        let email = request.email.as_deref().map(normalize_email).transpose()?;
        if let Some(phone) = &request.phone {
            validate_phone(phone)?;
        }
        if let Some(salary) = request.base_salary {
            validate_positive("baseSalary", salary)?;
        }
        let effective_from = request
            .effective_from
            .as_deref()
            .map(|d| parse_date("effectiveFrom", d))
            .transpose()?;
        let status = request
            .status
            .as_deref()
            .map(|s| {
                UserStatus::parse(s).ok_or_else(|| {
                    AppError::validation_field("status", "status must be 'active' or 'inactive'")
                })
            })
            .transpose()?;

        let txn = self.db().begin().await.context("Failed to begin transaction")?;

        let user = Self::fetch_user(&txn, id).await?;
        Self::ensure_unique_contact(&txn, email.as_deref(), request.phone.as_deref(), Some(id))
            .await?;

        let mut active: users::ActiveModel = user.into();
        if let Some(role_id) = request.role_id {
            Self::ensure_role_exists(&txn, role_id).await?;
            active.role_id = Set(role_id);
        }
        match request.franchise_id {
            Some(Some(franchise_id)) => {
                Self::ensure_franchise_exists(&txn, franchise_id).await?;
                active.franchise_id = Set(Some(franchise_id));
            }
            Some(None) => active.franchise_id = Set(None),
            None => {}
        }
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(email) = email {
            active.email = Set(email);
        }
        if let Some(phone) = request.phone {
            active.phone = Set(phone);
        }
        if let Some(salary) = request.base_salary {
            active.base_salary = Set(Some(salary));
        }
        if let Some(date) = effective_from {
            active.salary_effective_from = Set(Some(date));
        }
        if let Some(status) = status {
            active.status = Set(status.as_str().to_string());
        }
        active.updated_at = Set(Utc::now().naive_utc());

        let updated = active.update(&txn).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::validation(DUPLICATE_USER_MESSAGE)
            } else {
                AppError::database_with_source("Failed to update user", e)
            }
        })?;

        if status == Some(UserStatus::Inactive) {
            SessionStore::delete_all_for_user_in(&txn, id).await?;
        }

        txn.commit().await.context("Failed to commit user update")?;

        record_audit(
            &self.ctx.audit,
            AuditEntry::new(actor.user_id, "update", AUDIT_MODULE)
                .record_id(updated.id)
                .ip_address(client.ip())
                .user_agent(client.user_agent()),
        )
        .await;

        self.get(updated.id).await
    }

    /// 停用用户并吊销全部会话
    pub async fn deactivate(
        &self,
        actor: &AuthenticatedIdentity,
        client: &ClientInfo,
        id: i32,
    ) -> Result<()> {
        let txn = self.db().begin().await.context("Failed to begin transaction")?;

        let user = Self::fetch_user(&txn, id).await?;
        let mut active: users::ActiveModel = user.into();
        active.status = Set(UserStatus::Inactive.as_str().to_string());
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(&txn).await.context("Failed to deactivate user")?;

        let revoked = SessionStore::delete_all_for_user_in(&txn, id).await?;
        txn.commit().await.context("Failed to commit deactivation")?;

        linfo!(
            &client.request_id,
            LogStage::Internal,
            LogComponent::Users,
            "user_deactivated",
            &format!("User {id} deactivated by {}, {revoked} session(s) revoked", actor.user_id)
        );

        record_audit(
            &self.ctx.audit,
            AuditEntry::new(actor.user_id, "deactivate", AUDIT_MODULE)
                .record_id(id)
                .details(json!({ "revokedSessions": revoked }))
                .ip_address(client.ip())
                .user_agent(client.user_agent()),
        )
        .await;

        Ok(())
    }

    /// 重置密码并吊销全部会话
    pub async fn reset_password(
        &self,
        actor: &AuthenticatedIdentity,
        client: &ClientInfo,
        id: i32,
        request: ResetPasswordRequest,
    ) -> Result<()> {
        validate_password(&request.new_password)?;
        let password_hash =
            hash_password(&request.new_password, self.ctx.config.auth.bcrypt_cost)?;

        let txn = self.db().begin().await.context("Failed to begin transaction")?;

        let user = Self::fetch_user(&txn, id).await?;
        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(Some(password_hash));
        active.updated_at = Set(Utc::now().naive_utc());
        active.update(&txn).await.context("Failed to update password")?;

        SessionStore::delete_all_for_user_in(&txn, id).await?;
        txn.commit().await.context("Failed to commit password reset")?;

        record_audit(
            &self.ctx.audit,
            AuditEntry::new(actor.user_id, "reset_password", AUDIT_MODULE)
                .record_id(id)
                .ip_address(client.ip())
                .user_agent(client.user_agent()),
        )
        .await;

        Ok(())
    }

    async fn fetch_user<C: ConnectionTrait>(conn: &C, id: i32) -> Result<users::Model> {
        users::Entity::find_by_id(id)
            .one(conn)
            .await
            .context("Failed to fetch user")?
            .ok_or_else(|| AppError::not_found("User", id.to_string()))
    }

    async fn ensure_unique_contact<C: ConnectionTrait>(
        conn: &C,
        email: Option<&str>,
        phone: Option<&str>,
        exclude_id: Option<i32>,
    ) -> Result<()> {
        if email.is_none() && phone.is_none() {
            return Ok(());
        }

        let mut any = Condition::any();
        if let Some(email) = email {
            any = any.add(users::Column::Email.eq(email));
        }
        if let Some(phone) = phone {
            any = any.add(users::Column::Phone.eq(phone));
        }

        let mut select = users::Entity::find().filter(any);
        if let Some(id) = exclude_id {
            select = select.filter(users::Column::Id.ne(id));
        }

        let existing = select
            .one(conn)
            .await
            .context("Failed to check existing users")?;
        if existing.is_some() {
            return Err(AppError::validation(DUPLICATE_USER_MESSAGE));
        }
        Ok(())
    }

    async fn ensure_role_exists<C: ConnectionTrait>(conn: &C, role_id: i32) -> Result<()> {
        let role = roles::Entity::find_by_id(role_id)
            .one(conn)
            .await
            .context("Failed to load role")?;
        if role.is_none() {
            return Err(AppError::validation_field("roleId", "Invalid role ID"));
        }
        Ok(())
    }

    async fn ensure_franchise_exists<C: ConnectionTrait>(conn: &C, franchise_id: i32) -> Result<()> {
        let franchise = franchises::Entity::find_by_id(franchise_id)
            .one(conn)
            .await
            .context("Failed to load franchise")?;
        if franchise.is_none() {
            return Err(AppError::validation_field("franchiseId", "Invalid franchise ID"));
        }
        Ok(())
    }

    /// 下一个员工编号：前缀下最大数字加一
    async fn next_emp_id<C: ConnectionTrait>(conn: &C, location: LocationType) -> Result<String> {
        let prefix = location.emp_id_prefix();
        let existing: Vec<String> = users::Entity::find()
            .select_only()
            .column(users::Column::EmpId)
            .filter(users::Column::EmpId.starts_with(prefix))
            .into_tuple()
            .all(conn)
            .await
            .context("Failed to read employee ids")?;

        let next = next_sequence(existing.iter().map(String::as_str), prefix);
        Ok(format_code(prefix, next, EMP_ID_WIDTH))
    }

    fn filtered_users(query: &UserListQuery) -> Select<users::Entity> {
        let mut select = users::Entity::find();

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(users::Column::EmpId.contains(search))
                    .add(users::Column::Name.contains(search))
                    .add(users::Column::Email.contains(search))
                    .add(users::Column::Phone.contains(search)),
            );
        }
        if let Some(role_id) = query.role_id {
            select = select.filter(users::Column::RoleId.eq(role_id));
        }
        if let Some(location_type) = query.location_type.as_deref().filter(|s| !s.is_empty()) {
            select = select.filter(users::Column::LocationType.eq(location_type));
        }
        if let Some(franchise_id) = query.franchise_id {
            select = select.filter(users::Column::FranchiseId.eq(franchise_id));
        }
        if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
            select = select.filter(users::Column::Status.eq(status));
        }

        select
    }

    fn apply_sort(select: Select<users::Entity>, query: &UserListQuery) -> Select<users::Entity> {
        let column = match query.sort_by.as_deref().unwrap_or("createdAt") {
            "empId" => users::Column::EmpId,
            "name" => users::Column::Name,
            "email" => users::Column::Email,
            "status" => users::Column::Status,
            "locationType" => users::Column::LocationType,
            "lastLogin" => users::Column::LastLogin,
            "updatedAt" => users::Column::UpdatedAt,
            _ => users::Column::CreatedAt,
        };
        let order = SortOrder::parse(query.sort_order.as_deref()).into_order();

        select
            .order_by(column, order.clone())
            .order_by(users::Column::Id, order)
    }

    /// 批量加载角色与加盟店摘要
    async fn build_responses(&self, rows: Vec<users::Model>) -> Result<Vec<UserResponse>> {
        let mut role_ids: Vec<i32> = rows.iter().map(|u| u.role_id).collect();
        role_ids.sort_unstable();
        role_ids.dedup();
        let mut franchise_ids: Vec<i32> = rows.iter().filter_map(|u| u.franchise_id).collect();
        franchise_ids.sort_unstable();
        franchise_ids.dedup();

        let roles: HashMap<i32, RoleSummary> = if role_ids.is_empty() {
            HashMap::new()
        } else {
            roles::Entity::find()
                .filter(roles::Column::Id.is_in(role_ids))
                .all(self.db())
                .await
                .context("Failed to load roles")?
                .into_iter()
                .map(|role| {
                    (
                        role.id,
                        RoleSummary {
                            id: role.id,
                            name: role.name,
                            display_name: role.display_name,
                            permissions: None,
                        },
                    )
                })
                .collect()
        };

        let franchises: HashMap<i32, FranchiseSummary> = if franchise_ids.is_empty() {
            HashMap::new()
        } else {
            franchises::Entity::find()
                .filter(franchises::Column::Id.is_in(franchise_ids))
                .all(self.db())
                .await
                .context("Failed to load franchises")?
                .into_iter()
                .map(|f| (f.id, franchise_summary(f)))
                .collect()
        };

        Ok(rows
            .into_iter()
            .map(|user| {
                let role = roles.get(&user.role_id).cloned();
                let franchise = user.franchise_id.and_then(|id| franchises.get(&id).cloned());
                UserResponse::new(user, role, franchise)
            })
            .collect())
    }
}

fn franchise_summary(franchise: franchises::Model) -> FranchiseSummary {
    FranchiseSummary {
        id: franchise.id,
        name: franchise.name,
        franchise_code: franchise.franchise_code,
    }
}
