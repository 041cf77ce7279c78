//! # 权限模型
//!
//! 角色携带一组固定的布尔权限。没有层级、通配或继承，每一项权限都由角色单独授予。

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

macro_rules! define_permissions {
    ($( $(#[$doc:meta])* $variant:ident => $field:ident = $key:literal, )+) => {
        /// 权限键（封闭枚举，未知键无法构造）
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum PermissionKey {
            $(
                $(#[$doc])*
                #[serde(rename = $key)]
                $variant,
            )+
        }

        impl PermissionKey {
            /// 全部权限键，按存储顺序排列
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            /// 存储与接口中使用的键名
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $key,)+
                }
            }

            /// 从键名解析
            #[must_use]
            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($key => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        /// 角色的完整权限集合
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        pub struct PermissionSet {
            $(pub $field: bool,)+
        }

        impl PermissionSet {
            /// 读取单项权限
            #[must_use]
            pub const fn get(&self, key: PermissionKey) -> bool {
                match key {
                    $(PermissionKey::$variant => self.$field,)+
                }
            }

            /// 设置单项权限
            pub fn set(&mut self, key: PermissionKey, granted: bool) {
                match key {
                    $(PermissionKey::$variant => self.$field = granted,)+
                }
            }
        }
    };
}

define_permissions! {
    ViewDashboard => can_view_dashboard = "canViewDashboard",
    /// 用户管理（含考勤、角色下拉）
    ManageUsers => can_manage_users = "canManageUsers",
    ManageFranchises => can_manage_franchises = "canManageFranchises",
    ManageRoles => can_manage_roles = "canManageRoles",
    ViewAllFranchises => can_view_all_franchises = "canViewAllFranchises",
    ManageInventory => can_manage_inventory = "canManageInventory",
    ApproveInventoryTransfers => can_approve_inventory_transfers = "canApproveInventoryTransfers",
    ManageFinance => can_manage_finance = "canManageFinance",
    AssignLoanOptions => can_assign_loan_options = "canAssignLoanOptions",
    UploadDueLetters => can_upload_due_letters = "canUploadDueLetters",
    GenerateInvoices => can_generate_invoices = "canGenerateInvoices",
    VerifyCashDeposits => can_verify_cash_deposits = "canVerifyCashDeposits",
    ManageExpenses => can_manage_expenses = "canManageExpenses",
    ApproveExpenses => can_approve_expenses = "canApproveExpenses",
    ProcessSalary => can_process_salary = "canProcessSalary",
    ManageTransport => can_manage_transport = "canManageTransport",
    CreateTrips => can_create_trips = "canCreateTrips",
    ManageMarketing => can_manage_marketing = "canManageMarketing",
    ViewReports => can_view_reports = "canViewReports",
    ExportReports => can_export_reports = "canExportReports",
    /// 审计日志查询
    ViewAuditLogs => can_view_audit_logs = "canViewAuditLogs",
    ConfigureSystem => can_configure_system = "canConfigureSystem",
    CreateLeads => can_create_leads = "canCreateLeads",
    ViewOwnLeads => can_view_own_leads = "canViewOwnLeads",
    ViewAllLeads => can_view_all_leads = "canViewAllLeads",
    ReassignLeads => can_reassign_leads = "canReassignLeads",
    UploadDocuments => can_upload_documents = "canUploadDocuments",
    SelectLoanOption => can_select_loan_option = "canSelectLoanOption",
    UploadCashDeposit => can_upload_cash_deposit = "canUploadCashDeposit",
    ManageFranchiseLeads => can_manage_franchise_leads = "canManageFranchiseLeads",
    CreateFranchiseDeals => can_create_franchise_deals = "canCreateFranchiseDeals",
    VerifyFranchisePayments => can_verify_franchise_payments = "canVerifyFranchisePayments",
    CreateTickets => can_create_tickets = "canCreateTickets",
    ManageTickets => can_manage_tickets = "canManageTickets",
}

/// 检查权限：仅当该项严格为 `true` 时放行
#[must_use]
pub const fn has_permission(permissions: &PermissionSet, key: PermissionKey) -> bool {
    permissions.get(key)
}

impl PermissionSet {
    /// 拥有全部权限（超级管理员）
    #[must_use]
    pub fn all() -> Self {
        Self::from_granted(PermissionKey::ALL)
    }

    /// 只授予给定权限
    #[must_use]
    pub fn from_granted(keys: &[PermissionKey]) -> Self {
        let mut set = Self::default();
        for key in keys {
            set.set(*key, true);
        }
        set
    }

    /// 从存储的 JSON 构造
    ///
    /// 只有值为 JSON `true` 的键被授予；缺失、`false`、`"true"`、`1` 均视为未授予。
    #[must_use]
    pub fn from_json_value(value: &Value) -> Self {
        let mut set = Self::default();
        for key in PermissionKey::ALL {
            let granted = matches!(value.get(key.as_str()), Some(Value::Bool(true)));
            set.set(*key, granted);
        }
        set
    }

    /// 从 JSON 字符串构造
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::from_json_value(&value))
    }

    /// 序列化为 JSON 字符串（用于存储）
    #[must_use]
    pub fn to_json_string(&self) -> String {
        let map: serde_json::Map<String, Value> = PermissionKey::ALL
            .iter()
            .map(|key| (key.as_str().to_string(), Value::Bool(self.get(*key))))
            .collect();
        Value::Object(map).to_string()
    }

    /// 已授予的权限
    pub fn granted(&self) -> impl Iterator<Item = PermissionKey> + '_ {
        PermissionKey::ALL
            .iter()
            .copied()
            .filter(|key| self.get(*key))
    }
}

impl Serialize for PermissionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(PermissionKey::ALL.len()))?;
        for key in PermissionKey::ALL {
            map.serialize_entry(key.as_str(), &self.get(*key))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PermissionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json_value(&value))
    }
}

impl std::str::FromStr for PermissionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid permission key: {s}"))
    }
}

impl fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
