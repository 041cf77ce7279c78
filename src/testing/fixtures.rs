//! # 测试数据 Fixtures
//!
//! 角色、用户与加盟店的构建器，直接写入数据库

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use entity::{franchises, roles, users};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::json;

use crate::auth::password::hash_password;
use crate::auth::{PermissionKey, PermissionSet};

/// 测试中使用的 bcrypt 成本
pub const TEST_BCRYPT_COST: u32 = 4;
/// 默认测试密码
pub const TEST_PASSWORD: &str = "password123";

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_seq() -> u64 {
    SEQUENCE.fetch_add(1, Ordering::Relaxed)
}

/// 角色测试数据构建器
pub struct RoleFixture {
    pub name: String,
    pub display_name: String,
    pub is_system_role: bool,
    pub permissions: String,
}

impl RoleFixture {
    /// 创建没有任何权限的角色
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: name.to_string(),
            is_system_role: false,
            permissions: PermissionSet::default().to_json_string(),
        }
    }

    /// 授予指定权限
    pub fn grant(mut self, keys: &[PermissionKey]) -> Self {
        self.permissions = PermissionSet::from_granted(keys).to_json_string();
        self
    }

    /// 授予全部权限
    pub fn superadmin(mut self) -> Self {
        self.permissions = PermissionSet::all().to_json_string();
        self
    }

    /// 直接写入原始权限 JSON
    pub fn raw_permissions(mut self, raw: &str) -> Self {
        self.permissions = raw.to_string();
        self
    }

    pub async fn insert(self, db: &DatabaseConnection) -> roles::Model {
        let now = Utc::now().naive_utc();
        roles::ActiveModel {
            name: Set(self.name),
            display_name: Set(self.display_name),
            description: Set(None),
            is_system_role: Set(self.is_system_role),
            permissions: Set(self.permissions),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("插入测试角色失败")
    }
}

/// 用户测试数据构建器
pub struct UserFixture {
    pub emp_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: Option<String>,
    pub role_id: i32,
    pub location_type: String,
    pub franchise_id: Option<i32>,
    pub status: String,
}

impl UserFixture {
    /// 创建属于指定角色的总部用户，邮箱、手机号与工号自动唯一
    pub fn new(role_id: i32) -> Self {
        let n = next_seq();
        Self {
            emp_id: format!("TST{n:04}"),
            name: format!("Test User {n}"),
            email: format!("user{n}@example.com"),
            phone: format!("9{n:09}"),
            password: Some(TEST_PASSWORD.to_string()),
            role_id,
            location_type: "ho".to_string(),
            franchise_id: None,
            status: "active".to_string(),
        }
    }

    pub fn email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    /// 不设置密码哈希（无法登录）
    pub fn without_password(mut self) -> Self {
        self.password = None;
        self
    }

    /// 设置为停用状态
    pub fn inactive(mut self) -> Self {
        self.status = "inactive".to_string();
        self
    }

    pub async fn insert(self, db: &DatabaseConnection) -> users::Model {
        let now = Utc::now().naive_utc();
        let password_hash = self
            .password
            .map(|p| hash_password(&p, TEST_BCRYPT_COST).expect("哈希测试密码失败"));

        users::ActiveModel {
            emp_id: Set(self.emp_id),
            name: Set(self.name),
            email: Set(self.email),
            phone: Set(self.phone),
            password_hash: Set(password_hash),
            role_id: Set(self.role_id),
            franchise_id: Set(self.franchise_id),
            location_type: Set(self.location_type),
            base_salary: Set(Some(25000.0)),
            salary_effective_from: Set(None),
            status: Set(self.status),
            created_by: Set(None),
            last_login: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("插入测试用户失败")
    }
}

/// 插入一个启用中的加盟店
pub async fn insert_franchise(
    db: &DatabaseConnection,
    code: &str,
    name: &str,
    owner_id: i32,
) -> franchises::Model {
    let now = Utc::now().naive_utc();
    franchises::ActiveModel {
        franchise_code: Set(code.to_string()),
        name: Set(name.to_string()),
        deal_type: Set("A".to_string()),
        owner_id: Set(owner_id),
        address: Set(json!({
            "line1": "1 Test Street",
            "city": "Pune",
            "state": "MH",
            "pincode": "411001"
        })
        .to_string()),
        commission_structure: Set(json!({"type": "flat", "flatRate": 9000.0}).to_string()),
        status: Set("active".to_string()),
        activated_at: Set(Some(now)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("插入测试加盟店失败")
}
