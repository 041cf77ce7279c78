use serde::Serialize;

/// 数据库 OFFSET 的上限（SQLite 按有符号 64 位整数绑定）
const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// 分页参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    /// 当前页码（>= 1）
    pub page: u64,
    /// 每页条数（>= 1）
    pub limit: u64,
}

impl PaginationParams {
    /// 根据可选参数创建分页配置，并应用默认值与上限。
    #[must_use]
    pub fn new(page: Option<u64>, limit: Option<u64>, default_limit: u64, max_limit: u64) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(default_limit).clamp(1, max_limit);
        Self { page, limit }
    }

    /// 跳过的行数，超大页码饱和到 [`MAX_OFFSET`]
    #[must_use]
    pub const fn offset(&self) -> u64 {
        let offset = self.page.saturating_sub(1).saturating_mul(self.limit);
        if offset > MAX_OFFSET { MAX_OFFSET } else { offset }
    }
}

/// 标准分页信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationInfo {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl From<PaginationInfo> for crate::management::response::Pagination {
    fn from(value: PaginationInfo) -> Self {
        Self {
            page: value.page,
            limit: value.limit,
            total: value.total,
            pages: value.pages,
        }
    }
}

/// 根据总数和分页参数计算分页信息。
#[must_use]
pub const fn build_page(total: u64, params: PaginationParams) -> PaginationInfo {
    let pages = if total == 0 {
        0
    } else {
        total.div_ceil(params.limit)
    };
    PaginationInfo {
        page: params.page,
        limit: params.limit,
        total,
        pages,
    }
}

/// 排序方向，默认降序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    #[must_use]
    pub const fn into_order(self) -> sea_orm::Order {
        match self {
            Self::Asc => sea_orm::Order::Asc,
            Self::Desc => sea_orm::Order::Desc,
        }
    }
}
