//! # 服务层共享工具
//!
//! 分页、排序、字段校验、编号生成以及审计写入的辅助方法。

pub mod codes;
pub mod pagination;
pub mod validation;

pub use pagination::{PaginationInfo, PaginationParams, SortOrder, build_page};

use crate::auth::{AuditEntry, AuditSink};

/// 写入业务审计记录
///
/// 审计失败已由写入器记录，不影响业务结果。
pub async fn record_audit(audit: &AuditSink, entry: AuditEntry) {
    // 审计是尽力而为的：结果有意丢弃
    let _ = audit.record(entry).await;
}

#[cfg(test)]
mod tests;
