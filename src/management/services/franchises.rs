//! # 加盟店管理服务
//!
//! 加盟店的查询、创建、更新与停业，以及用户表单使用的加盟店下拉选项。
//! 佣金结构未指定时按合作类型取默认值。

use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use entity::{franchises, users};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::shared::codes::{
    FRANCHISE_CODE_PREFIX, FRANCHISE_CODE_WIDTH, format_code, next_sequence,
};
use super::shared::validation::{validate_length, validate_pincode, validate_required};
use super::shared::{PaginationParams, SortOrder, build_page, record_audit};
use crate::app::AppContext;
use crate::auth::{AuditEntry, AuthenticatedIdentity};
use crate::error::{AppError, Context, Result, is_unique_violation};
use crate::linfo;
use crate::logging::{LogComponent, LogStage};
use crate::management::middleware::ClientInfo;
use crate::management::response::Pagination;

pub const AUDIT_MODULE: &str = "franchises";
/// 库存调拨佣金默认值
pub const DEFAULT_TRANSFER_COMMISSION: f64 = 10.0;

/// 合作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealType {
    A,
    B,
    C,
}

impl DealType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }
}

/// 加盟店状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FranchiseStatus {
    Active,
    Suspended,
}

impl FranchiseStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }
}

/// 地址
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl Address {
    fn validate(&self) -> Result<()> {
        validate_required("line1", &self.line1, "Address line 1 is required")?;
        validate_required("city", &self.city, "City is required")?;
        validate_required("state", &self.state, "State is required")?;
        validate_pincode(&self.pincode)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommissionType {
    Tiered,
    Flat,
}

/// 阶梯佣金：销量在 `[minSales, maxSales]` 区间内每单金额
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionTier {
    pub min_sales: u32,
    pub max_sales: u32,
    pub amount_per_sale: f64,
}

/// 佣金结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionStructure {
    #[serde(rename = "type")]
    pub kind: CommissionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiers: Option<Vec<CommissionTier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat_rate: Option<f64>,
    #[serde(default = "default_transfer_commission")]
    pub inventory_transfer_commission: f64,
}

const fn default_transfer_commission() -> f64 {
    DEFAULT_TRANSFER_COMMISSION
}

const fn tier(min_sales: u32, max_sales: u32, amount_per_sale: f64) -> CommissionTier {
    CommissionTier {
        min_sales,
        max_sales,
        amount_per_sale,
    }
}

impl CommissionStructure {
    /// 按合作类型给出默认佣金：B 为固定 9000，A/C 为三档阶梯
    #[must_use]
    pub fn default_for(deal_type: DealType) -> Self {
        let tiers = match deal_type {
            DealType::B => {
                return Self {
                    kind: CommissionType::Flat,
                    tiers: None,
                    flat_rate: Some(9000.0),
                    inventory_transfer_commission: DEFAULT_TRANSFER_COMMISSION,
                };
            }
            DealType::A => vec![tier(1, 10, 7000.0), tier(11, 15, 6000.0), tier(16, 20, 5000.0)],
            DealType::C => vec![tier(1, 10, 6500.0), tier(11, 15, 5000.0), tier(16, 20, 4000.0)],
        };

        Self {
            kind: CommissionType::Tiered,
            tiers: Some(tiers),
            flat_rate: None,
            inventory_transfer_commission: DEFAULT_TRANSFER_COMMISSION,
        }
    }

    fn validate(&self) -> Result<()> {
        for tier in self.tiers.iter().flatten() {
            if !(tier.amount_per_sale.is_finite() && tier.amount_per_sale > 0.0) {
                return Err(AppError::validation_field(
                    "commissionStructure",
                    "amountPerSale must be a positive number",
                ));
            }
            if tier.min_sales > tier.max_sales {
                return Err(AppError::validation_field(
                    "commissionStructure",
                    "minSales must not exceed maxSales",
                ));
            }
        }
        Ok(())
    }
}

/// 加盟店列表查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FranchiseListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub deal_type: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// 创建加盟店请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFranchiseRequest {
    pub name: String,
    pub deal_type: DealType,
    pub owner_id: i32,
    pub address: Address,
    pub commission_structure: Option<CommissionStructure>,
}

/// 更新加盟店请求
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFranchiseRequest {
    pub name: Option<String>,
    pub owner_id: Option<i32>,
    pub address: Option<Address>,
    pub commission_structure: Option<CommissionStructure>,
    pub status: Option<FranchiseStatus>,
}

/// 店主摘要
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: i32,
    pub name: String,
    pub emp_id: String,
    pub email: String,
    pub phone: String,
}

/// 加盟店响应
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FranchiseResponse {
    pub id: i32,
    pub franchise_code: String,
    pub name: String,
    pub deal_type: String,
    pub owner_id: i32,
    pub owner: Option<OwnerSummary>,
    pub address: Value,
    pub commission_structure: Value,
    pub status: String,
    pub activated_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl FranchiseResponse {
    fn new(franchise: franchises::Model, owner: Option<OwnerSummary>) -> Self {
        Self {
            id: franchise.id,
            franchise_code: franchise.franchise_code,
            name: franchise.name,
            deal_type: franchise.deal_type,
            owner_id: franchise.owner_id,
            owner,
            address: parse_stored_json(&franchise.address),
            commission_structure: parse_stored_json(&franchise.commission_structure),
            status: franchise.status,
            activated_at: franchise.activated_at,
            created_at: franchise.created_at,
            updated_at: franchise.updated_at,
        }
    }
}

/// 下拉选项
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FranchiseOption {
    pub id: i32,
    pub name: String,
    pub franchise_code: String,
    pub deal_type: String,
    pub status: String,
    pub address: Value,
    pub owner: Option<OwnerSummary>,
}

#[derive(Debug)]
pub struct ListFranchisesResult {
    pub franchises: Vec<FranchiseResponse>,
    pub pagination: Pagination,
}

fn parse_stored_json(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or(Value::Null)
}

fn owner_summary(user: users::Model) -> OwnerSummary {
    OwnerSummary {
        id: user.id,
        name: user.name,
        emp_id: user.emp_id,
        email: user.email,
        phone: user.phone,
    }
}

/// 加盟店服务
pub struct FranchisesService<'a> {
    ctx: &'a AppContext,
}

impl<'a> FranchisesService<'a> {
    #[must_use]
    pub const fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    fn db(&self) -> &'a DatabaseConnection {
        self.ctx.db.as_ref()
    }

    /// 分页列出加盟店
    pub async fn list(&self, query: &FranchiseListQuery) -> Result<ListFranchisesResult> {
        let params = PaginationParams::new(query.page, query.limit, 10, 100);

        let total = Self::filtered(query)
            .count(self.db())
            .await
            .context("Failed to count franchises")?;

        let rows = Self::apply_sort(Self::filtered(query), query)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db())
            .await
            .context("Failed to fetch franchises")?;

        let owners = self.load_owners(rows.iter().map(|f| f.owner_id)).await?;
        let franchises = rows
            .into_iter()
            .map(|f| {
                let owner = owners.get(&f.owner_id).cloned();
                FranchiseResponse::new(f, owner)
            })
            .collect();

        Ok(ListFranchisesResult {
            franchises,
            pagination: build_page(total, params).into(),
        })
    }

    /// 加盟店详情
    pub async fn get(&self, id: i32) -> Result<FranchiseResponse> {
        let franchise = Self::fetch(self.db(), id).await?;
        let owner = users::Entity::find_by_id(franchise.owner_id)
            .one(self.db())
            .await
            .context("Failed to load franchise owner")?
            .map(owner_summary);
        Ok(FranchiseResponse::new(franchise, owner))
    }

    /// 启用中的加盟店，按名称排序
    pub async fn active_options(&self) -> Result<Vec<FranchiseOption>> {
        let rows = franchises::Entity::find()
            .filter(franchises::Column::Status.eq(FranchiseStatus::Active.as_str()))
            .order_by_asc(franchises::Column::Name)
            .all(self.db())
            .await
            .context("Failed to fetch franchises")?;

        let owners = self.load_owners(rows.iter().map(|f| f.owner_id)).await?;
        Ok(rows
            .into_iter()
            .map(|f| FranchiseOption {
                owner: owners.get(&f.owner_id).cloned(),
                address: parse_stored_json(&f.address),
                id: f.id,
                name: f.name,
                franchise_code: f.franchise_code,
                deal_type: f.deal_type,
                status: f.status,
            })
            .collect())
    }

    /// 创建加盟店，编号自动生成
    pub async fn create(
        &self,
        actor: &AuthenticatedIdentity,
        client: &ClientInfo,
        request: CreateFranchiseRequest,
    ) -> Result<FranchiseResponse> {
        validate_length("name", &request.name, 2, 100)?;
        request.address.validate()?;
        let commission = request
            .commission_structure
            .unwrap_or_else(|| CommissionStructure::default_for(request.deal_type));
        commission.validate()?;

        let address_json = serde_json::to_string(&request.address)?;
        let commission_json = serde_json::to_string(&commission)?;

        let txn = self.db().begin().await.context("Failed to begin transaction")?;

        Self::ensure_owner_exists(&txn, request.owner_id).await?;
        let code = Self::next_code(&txn).await?;
        let now = Utc::now().naive_utc();

        let franchise = franchises::ActiveModel {
            franchise_code: Set(code.clone()),
            name: Set(request.name.trim().to_string()),
            deal_type: Set(request.deal_type.as_str().to_string()),
            owner_id: Set(request.owner_id),
            address: Set(address_json),
            commission_structure: Set(commission_json),
            status: Set(FranchiseStatus::Active.as_str().to_string()),
            activated_at: Set(Some(now)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict_with_source("Franchise", code.clone(), e)
            } else {
                AppError::database_with_source("Failed to create franchise", e)
            }
        })?;

        txn.commit().await.context("Failed to commit franchise creation")?;

        linfo!(
            &client.request_id,
            LogStage::Internal,
            LogComponent::Franchises,
            "franchise_created",
            &format!("Franchise {} created by {}", franchise.franchise_code, actor.user_id)
        );

        record_audit(
            &self.ctx.audit,
            AuditEntry::new(actor.user_id, "create", AUDIT_MODULE)
                .record_id(franchise.id)
                .details(json!({
                    "franchiseCode": franchise.franchise_code,
                    "dealType": franchise.deal_type,
                }))
                .ip_address(client.ip())
                .user_agent(client.user_agent()),
        )
        .await;

        self.get(franchise.id).await
    }

    /// 更新加盟店
    pub async fn update(
        &self,
        actor: &AuthenticatedIdentity,
        client: &ClientInfo,
        id: i32,
        request: UpdateFranchiseRequest,
    ) -> Result<FranchiseResponse> {
        if let Some(name) = &request.name {
            validate_length("name", name, 2, 100)?;
        }
        if let Some(address) = &request.address {
            address.validate()?;
        }
        if let Some(commission) = &request.commission_structure {
            commission.validate()?;
        }

        let txn = self.db().begin().await.context("Failed to begin transaction")?;

        let franchise = Self::fetch(&txn, id).await?;
        let mut active: franchises::ActiveModel = franchise.into();

        if let Some(owner_id) = request.owner_id {
            Self::ensure_owner_exists(&txn, owner_id).await?;
            active.owner_id = Set(owner_id);
        }
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(address) = &request.address {
            active.address = Set(serde_json::to_string(address)?);
        }
        if let Some(commission) = &request.commission_structure {
            active.commission_structure = Set(serde_json::to_string(commission)?);
        }
        if let Some(status) = request.status {
            active.status = Set(status.as_str().to_string());
        }
        active.updated_at = Set(Utc::now().naive_utc());

        let updated = active
            .update(&txn)
            .await
            .context("Failed to update franchise")?;
        txn.commit().await.context("Failed to commit franchise update")?;

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

    /// 停业（软删除）
    pub async fn suspend(
        &self,
        actor: &AuthenticatedIdentity,
        client: &ClientInfo,
        id: i32,
    ) -> Result<()> {
        let franchise = Self::fetch(self.db(), id).await?;
        let mut active: franchises::ActiveModel = franchise.into();
        active.status = Set(FranchiseStatus::Suspended.as_str().to_string());
        active.updated_at = Set(Utc::now().naive_utc());
        active
            .update(self.db())
            .await
            .context("Failed to suspend franchise")?;

        record_audit(
            &self.ctx.audit,
            AuditEntry::new(actor.user_id, "suspend", AUDIT_MODULE)
                .record_id(id)
                .ip_address(client.ip())
                .user_agent(client.user_agent()),
        )
        .await;

        Ok(())
    }

    async fn fetch<C: ConnectionTrait>(conn: &C, id: i32) -> Result<franchises::Model> {
        franchises::Entity::find_by_id(id)
            .one(conn)
            .await
            .context("Failed to fetch franchise")?
            .ok_or_else(|| AppError::not_found("Franchise", id.to_string()))
    }

    async fn ensure_owner_exists<C: ConnectionTrait>(conn: &C, owner_id: i32) -> Result<()> {
        let owner = users::Entity::find_by_id(owner_id)
            .one(conn)
            .await
            .context("Failed to load owner")?;
        if owner.is_none() {
            return Err(AppError::validation_field("ownerId", "Invalid owner ID"));
        }
        Ok(())
    }

    async fn next_code<C: ConnectionTrait>(conn: &C) -> Result<String> {
        let existing: Vec<String> = franchises::Entity::find()
            .select_only()
            .column(franchises::Column::FranchiseCode)
            .into_tuple()
            .all(conn)
            .await
            .context("Failed to read franchise codes")?;

        let next = next_sequence(existing.iter().map(String::as_str), FRANCHISE_CODE_PREFIX);
        Ok(format_code(FRANCHISE_CODE_PREFIX, next, FRANCHISE_CODE_WIDTH))
    }

    async fn load_owners(
        &self,
        ids: impl Iterator<Item = i32>,
    ) -> Result<HashMap<i32, OwnerSummary>> {
        let mut ids: Vec<i32> = ids.collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        Ok(users::Entity::find()
            .filter(users::Column::Id.is_in(ids))
            .all(self.db())
            .await
            .context("Failed to load franchise owners")?
            .into_iter()
            .map(|u| (u.id, owner_summary(u)))
            .collect())
    }

    fn filtered(query: &FranchiseListQuery) -> Select<franchises::Entity> {
        let mut select = franchises::Entity::find();

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            select = select.filter(
                Condition::any()
                    .add(franchises::Column::FranchiseCode.contains(search))
                    .add(franchises::Column::Name.contains(search)),
            );
        }
        if let Some(deal_type) = query.deal_type.as_deref().filter(|s| !s.is_empty()) {
            select = select.filter(franchises::Column::DealType.eq(deal_type));
        }
        if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
            select = select.filter(franchises::Column::Status.eq(status));
        }

        select
    }

    fn apply_sort(
        select: Select<franchises::Entity>,
        query: &FranchiseListQuery,
    ) -> Select<franchises::Entity> {
        let column = match query.sort_by.as_deref().unwrap_or("createdAt") {
            "name" => franchises::Column::Name,
            "franchiseCode" => franchises::Column::FranchiseCode,
            "dealType" => franchises::Column::DealType,
            "status" => franchises::Column::Status,
            "activatedAt" => franchises::Column::ActivatedAt,
            "updatedAt" => franchises::Column::UpdatedAt,
            _ => franchises::Column::CreatedAt,
        };
        let order = SortOrder::parse(query.sort_order.as_deref()).into_order();

        select
            .order_by(column, order.clone())
            .order_by(franchises::Column::Id, order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_commission_by_deal_type() {
        let b = CommissionStructure::default_for(DealType::B);
        assert_eq!(b.kind, CommissionType::Flat);
        assert_eq!(b.flat_rate, Some(9000.0));
        assert_eq!(b.tiers, None);

        let a = CommissionStructure::default_for(DealType::A);
        let amounts: Vec<f64> = a.tiers.unwrap().iter().map(|t| t.amount_per_sale).collect();
        assert_eq!(amounts, vec![7000.0, 6000.0, 5000.0]);

        let c = CommissionStructure::default_for(DealType::C);
        let tiers = c.tiers.unwrap();
        assert_eq!(tiers[0], tier(1, 10, 6500.0));
        assert_eq!(tiers[2], tier(16, 20, 4000.0));
        assert_eq!(c.inventory_transfer_commission, DEFAULT_TRANSFER_COMMISSION);
    }

    #[test]
    fn test_commission_json_shape() {
        let value = serde_json::to_value(CommissionStructure::default_for(DealType::B)).unwrap();
        assert_eq!(
            value,
            json!({"type": "flat", "flatRate": 9000.0, "inventoryTransferCommission": 10.0})
        );

        let parsed: CommissionStructure =
            serde_json::from_value(json!({"type": "tiered", "tiers": []})).unwrap();
        assert_eq!(parsed.inventory_transfer_commission, DEFAULT_TRANSFER_COMMISSION);
    }

    #[test]
    fn test_commission_validation() {
        let mut structure = CommissionStructure::default_for(DealType::A);
        assert!(structure.validate().is_ok());
        if let Some(tiers) = structure.tiers.as_mut() {
            tiers[0].amount_per_sale = 0.0;
        }
        assert!(structure.validate().is_err());
    }

    #[test]
    fn test_address_validation() {
        let mut address = Address {
            line1: "12 MG Road".to_string(),
            line2: None,
            city: "Pune".to_string(),
            state: "MH".to_string(),
            pincode: "411001".to_string(),
        };
        assert!(address.validate().is_ok());
        address.pincode = "4110".to_string();
        assert!(address.validate().is_err());
        address.pincode = "411001".to_string();
        address.city = " ".to_string();
        assert!(address.validate().is_err());
    }

    #[test]
    fn test_deal_type_rejects_unknown() {
        assert!(serde_json::from_value::<DealType>(json!("D")).is_err());
        assert_eq!(serde_json::from_value::<DealType>(json!("B")).unwrap(), DealType::B);
    }
}
