//! # 会话存储
//!
//! 令牌到会话记录的持久化映射。过期记录在查找时惰性删除，其余由定时任务清理。

use std::sync::Arc;

use chrono::{Duration, Utc};
use entity::user_sessions;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};

use super::token::{generate_token, hash_token};
use crate::error::{Context, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, linfo};

/// 新建会话：原始令牌只在此处返回一次
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub session: user_sessions::Model,
}

/// 会话存储
pub struct SessionStore {
    db: Arc<DatabaseConnection>,
    ttl: Duration,
}

impl SessionStore {
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    /// 会话有效期
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 创建会话
    pub async fn create(
        &self,
        user_id: i32,
        device_info: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<IssuedSession> {
        let token = generate_token();
        let now = Utc::now().naive_utc();

        let session = user_sessions::ActiveModel {
            user_id: Set(user_id),
            token_hash: Set(hash_token(&token)),
            device_info: Set(device_info.map(ToString::to_string)),
            ip_address: Set(ip_address.map(ToString::to_string)),
            expires_at: Set(now + self.ttl),
            last_activity_at: Set(now),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
        .context("Failed to create session")?;

        ldebug!(
            "system",
            LogStage::Authentication,
            LogComponent::Session,
            "session_created",
            &format!("Created session {} for user {user_id}", session.id),
            expires_at = %session.expires_at
        );

        Ok(IssuedSession { token, session })
    }

    /// 查找未过期的会话
    ///
    /// 找到已过期的记录时顺带删除。
    pub async fn find_valid_by_token(&self, token: &str) -> Result<Option<user_sessions::Model>> {
        let Some(session) = user_sessions::Entity::find()
            .filter(user_sessions::Column::TokenHash.eq(hash_token(token)))
            .one(self.db.as_ref())
            .await
            .context("Failed to look up session")?
        else {
            return Ok(None);
        };

        if session.expires_at <= Utc::now().naive_utc() {
            self.delete_by_id(session.id).await?;
            ldebug!(
                "system",
                LogStage::Authentication,
                LogComponent::Session,
                "session_expired",
                &format!("Evicted expired session {}", session.id)
            );
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// 刷新最近活动时间
    pub async fn touch(&self, session_id: i32) -> Result<()> {
        user_sessions::Entity::update_many()
            .col_expr(
                user_sessions::Column::LastActivityAt,
                sea_orm::sea_query::Expr::value(Utc::now().naive_utc()),
            )
            .filter(user_sessions::Column::Id.eq(session_id))
            .exec(self.db.as_ref())
            .await
            .context("Failed to touch session")?;
        Ok(())
    }

    /// 按令牌删除（登出）
    pub async fn delete_by_token(&self, token: &str) -> Result<u64> {
        let result = user_sessions::Entity::delete_many()
            .filter(user_sessions::Column::TokenHash.eq(hash_token(token)))
            .exec(self.db.as_ref())
            .await
            .context("Failed to delete session")?;
        Ok(result.rows_affected)
    }

    /// 按ID删除
    pub async fn delete_by_id(&self, session_id: i32) -> Result<u64> {
        let result = user_sessions::Entity::delete_by_id(session_id)
            .exec(self.db.as_ref())
            .await
            .context("Failed to delete session")?;
        Ok(result.rows_affected)
    }

    /// 删除用户的全部会话
    pub async fn delete_all_for_user(&self, user_id: i32) -> Result<u64> {
        Self::delete_all_for_user_in(self.db.as_ref(), user_id).await
    }

    /// 在给定连接或事务中删除用户的全部会话（单条 DELETE 语句）
    pub async fn delete_all_for_user_in<C: ConnectionTrait>(conn: &C, user_id: i32) -> Result<u64> {
        let result = user_sessions::Entity::delete_many()
            .filter(user_sessions::Column::UserId.eq(user_id))
            .exec(conn)
            .await
            .context("Failed to revoke user sessions")?;

        if result.rows_affected > 0 {
            linfo!(
                "system",
                LogStage::Authentication,
                LogComponent::Session,
                "sessions_revoked",
                &format!("Revoked {} session(s) for user {user_id}", result.rows_affected)
            );
        }
        Ok(result.rows_affected)
    }

    /// 删除所有已过期的会话
    pub async fn delete_expired(&self) -> Result<u64> {
        let result = user_sessions::Entity::delete_many()
            .filter(user_sessions::Column::ExpiresAt.lte(Utc::now().naive_utc()))
            .exec(self.db.as_ref())
            .await
            .context("Failed to delete expired sessions")?;
        Ok(result.rows_affected)
    }
}
