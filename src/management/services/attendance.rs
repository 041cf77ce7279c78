//! # 考勤服务
//!
//! 登录成功时记录当天首次登录；按条件查询考勤与个人历史统计。

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use entity::{attendance, users};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use serde::{Deserialize, Serialize};

use super::shared::validation::parse_date;
use super::shared::{PaginationParams, build_page};
use crate::app::AppContext;
use crate::error::{AppError, Context, Result, is_unique_violation};
use crate::logging::{LogComponent, LogStage};
use crate::management::response::Pagination;
use crate::{ldebug, lwarn};

/// 考勤日期格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 记录当天首次登录
///
/// 返回 `true` 表示新增了记录，`false` 表示当天已有记录。
pub async fn record_login(db: &DatabaseConnection, user_id: i32) -> Result<bool> {
    let now = Utc::now().naive_utc();
    let today = now.date().format(DATE_FORMAT).to_string();

    let existing = attendance::Entity::find()
        .filter(attendance::Column::UserId.eq(user_id))
        .filter(attendance::Column::Date.eq(today.as_str()))
        .one(db)
        .await;
    match existing {
        Ok(Some(_)) => return Ok(false),
        Ok(None) => {}
        Err(e) => {
            lwarn!(
                "system",
                LogStage::Authentication,
                LogComponent::Attendance,
                "attendance_check_fail",
                &format!("Failed to check attendance for user {user_id}: {e}")
            );
            return Err(AppError::database_with_source("Failed to check attendance", e));
        }
    }

    let inserted = attendance::ActiveModel {
        user_id: Set(user_id),
        date: Set(today.clone()),
        login_time: Set(now),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(_) => {
            ldebug!(
                "system",
                LogStage::Authentication,
                LogComponent::Attendance,
                "attendance_recorded",
                &format!("Attendance recorded for user {user_id} on {today}")
            );
            Ok(true)
        }
        // 并发登录时唯一索引保证只有一条
        Err(e) if is_unique_violation(&e) => Ok(false),
        Err(e) => {
            lwarn!(
                "system",
                LogStage::Authentication,
                LogComponent::Attendance,
                "attendance_write_fail",
                &format!("Failed to record attendance for user {user_id}: {e}")
            );
            Err(AppError::database_with_source("Failed to record attendance", e))
        }
    }
}

/// 考勤列表查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub user_id: Option<i32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// 个人考勤历史查询参数
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceHistoryQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceUser {
    pub emp_id: String,
    pub name: String,
    pub email: String,
}

/// 考勤记录
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: i32,
    pub user_id: i32,
    pub date: String,
    pub login_time: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<AttendanceUser>,
}

/// 个人历史中的单日记录
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceDay {
    pub date: String,
    pub login_time: NaiveDateTime,
}

/// 出勤统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub total_days: u64,
    pub this_month: u64,
    pub this_year: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceHistory {
    pub attendance: Vec<AttendanceDay>,
    pub stats: AttendanceStats,
}

#[derive(Debug)]
pub struct ListAttendanceResult {
    pub records: Vec<AttendanceRecord>,
    pub pagination: Pagination,
}

/// 统计给定日期中总天数、本月天数与本年天数
///
/// 无法解析的日期只计入总数。
#[must_use]
pub fn compute_stats<'a>(dates: impl IntoIterator<Item = &'a str>, today: NaiveDate) -> AttendanceStats {
    let mut stats = AttendanceStats::default();
    for raw in dates {
        stats.total_days += 1;
        let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) else {
            continue;
        };
        if date.year() == today.year() {
            stats.this_year += 1;
            if date.month() == today.month() {
                stats.this_month += 1;
            }
        }
    }
    stats
}

fn date_bound(field: &str, raw: Option<&str>) -> Result<Option<String>> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_date(field, s).map(|d| d.format(DATE_FORMAT).to_string()))
        .transpose()
}

fn with_date_range(
    mut select: Select<attendance::Entity>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Select<attendance::Entity>> {
    if let Some(start) = date_bound("startDate", start)? {
        select = select.filter(attendance::Column::Date.gte(start));
    }
    if let Some(end) = date_bound("endDate", end)? {
        select = select.filter(attendance::Column::Date.lte(end));
    }
    Ok(select)
}

/// 考勤服务
pub struct AttendanceService<'a> {
    ctx: &'a AppContext,
}

impl<'a> AttendanceService<'a> {
    #[must_use]
    pub const fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    fn db(&self) -> &'a DatabaseConnection {
        self.ctx.db.as_ref()
    }

    /// 分页查询考勤，按日期与登录时间倒序
    pub async fn list(&self, query: &AttendanceListQuery) -> Result<ListAttendanceResult> {
        let params = PaginationParams::new(query.page, query.limit, 25, 100);

        let mut select = attendance::Entity::find();
        if let Some(user_id) = query.user_id {
            select = select.filter(attendance::Column::UserId.eq(user_id));
        }
        let select = with_date_range(select, query.start_date.as_deref(), query.end_date.as_deref())?;

        let total = select
            .clone()
            .count(self.db())
            .await
            .context("Failed to count attendance")?;

        let rows = select
            .order_by_desc(attendance::Column::Date)
            .order_by_desc(attendance::Column::LoginTime)
            .offset(params.offset())
            .limit(params.limit)
            .all(self.db())
            .await
            .context("Failed to fetch attendance")?;

        let mut user_ids: Vec<i32> = rows.iter().map(|r| r.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();
        let users: HashMap<i32, AttendanceUser> = if user_ids.is_empty() {
            HashMap::new()
        } else {
            users::Entity::find()
                .filter(users::Column::Id.is_in(user_ids))
                .all(self.db())
                .await
                .context("Failed to load attendance users")?
                .into_iter()
                .map(|u| {
                    (
                        u.id,
                        AttendanceUser {
                            emp_id: u.emp_id,
                            name: u.name,
                            email: u.email,
                        },
                    )
                })
                .collect()
        };

        let records = rows
            .into_iter()
            .map(|r| AttendanceRecord {
                user: users.get(&r.user_id).cloned(),
                id: r.id,
                user_id: r.user_id,
                date: r.date,
                login_time: r.login_time,
            })
            .collect();

        Ok(ListAttendanceResult {
            records,
            pagination: build_page(total, params).into(),
        })
    }

    /// 单个用户的考勤历史与统计
    pub async fn history(
        &self,
        user_id: i32,
        query: &AttendanceHistoryQuery,
    ) -> Result<AttendanceHistory> {
        let limit = query.limit.unwrap_or(100).clamp(1, 366);
        let select = attendance::Entity::find().filter(attendance::Column::UserId.eq(user_id));
        let select = with_date_range(select, query.start_date.as_deref(), query.end_date.as_deref())?;

        let attendance: Vec<AttendanceDay> = select
            .order_by_desc(attendance::Column::Date)
            .limit(limit)
            .all(self.db())
            .await
            .context("Failed to fetch attendance history")?
            .into_iter()
            .map(|r| AttendanceDay {
                date: r.date,
                login_time: r.login_time,
            })
            .collect();

        let today = Utc::now().date_naive();
        let stats = compute_stats(attendance.iter().map(|d| d.date.as_str()), today);

        Ok(AttendanceHistory { attendance, stats })
    }
}
