//! # 认证类型定义
//!
//! 会话解析得到的身份，以及用户账户相关的枚举

use serde::{Deserialize, Serialize};
use std::fmt;

use super::permissions::{PermissionKey, PermissionSet, has_permission};

/// 已认证的请求身份
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedIdentity {
    /// 用户ID
    pub user_id: i32,
    pub email: String,
    pub name: String,
    /// 员工编号
    pub emp_id: String,
    pub role_id: i32,
    /// 角色标识，如 `hr-manager`
    pub role_name: String,
    /// 角色的完整权限集合
    pub permissions: PermissionSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub franchise_id: Option<i32>,
    pub location_type: LocationType,
    /// 当前会话ID（不对外输出）
    #[serde(skip)]
    pub session_id: i32,
}

impl AuthenticatedIdentity {
    /// 检查当前身份是否拥有某项权限
    #[must_use]
    pub const fn can(&self, key: PermissionKey) -> bool {
        has_permission(&self.permissions, key)
    }
}

/// 用户所属位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    /// 总部
    Ho,
    /// 加盟店
    Franchise,
}

impl LocationType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ho => "ho",
            Self::Franchise => "franchise",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ho" => Some(Self::Ho),
            "franchise" => Some(Self::Franchise),
            _ => None,
        }
    }

    /// 员工编号前缀
    #[must_use]
    pub const fn emp_id_prefix(self) -> &'static str {
        match self {
            Self::Ho => "HO",
            Self::Franchise => "FR",
        }
    }
}

impl std::str::FromStr for LocationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid location type: {s}"))
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 账户状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }

    /// 只有严格等于 `active` 的状态才算激活
    #[must_use]
    pub fn is_active_str(s: &str) -> bool {
        Self::parse(s) == Some(Self::Active)
    }
}

impl std::str::FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid user status: {s}"))
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_type_conversion() {
        assert_eq!(LocationType::parse("ho"), Some(LocationType::Ho));
        assert_eq!(LocationType::Franchise.as_str(), "franchise");
        assert_eq!(LocationType::Franchise.emp_id_prefix(), "FR");
        assert!("HQ".parse::<LocationType>().is_err());
    }

    #[test]
    fn test_user_status_is_strict() {
        assert!(UserStatus::is_active_str("active"));
        assert!(!UserStatus::is_active_str("Active"));
        assert!(!UserStatus::is_active_str("inactive"));
        assert!(!UserStatus::is_active_str(""));
    }

    #[test]
    fn test_identity_serialization_hides_session_id() {
        let identity = AuthenticatedIdentity {
            user_id: 3,
            email: "hr@example.com".to_string(),
            name: "HR".to_string(),
            emp_id: "HO003".to_string(),
            role_id: 2,
            role_name: "hr-manager".to_string(),
            permissions: PermissionSet::from_granted(&[PermissionKey::ManageUsers]),
            franchise_id: None,
            location_type: LocationType::Ho,
            session_id: 99,
        };

        let value = serde_json::to_value(&identity).unwrap();
        assert_eq!(value["userId"], 3);
        assert_eq!(value["roleName"], "hr-manager");
        assert_eq!(value["locationType"], "ho");
        assert_eq!(value["permissions"]["canManageUsers"], true);
        assert!(value.get("sessionId").is_none());
        assert!(value.get("franchiseId").is_none());
        assert!(identity.can(PermissionKey::ManageUsers));
    }
}
