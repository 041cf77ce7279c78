//! # 会话解析
//!
//! 把请求 Cookie 解析为已认证身份。对外只返回 `Option`，存储层故障按未认证处理。

use std::sync::Arc;

use axum::http::HeaderMap;
use entity::{roles, users};
use sea_orm::{DatabaseConnection, EntityTrait};

use super::cookie::parse_cookie;
use super::permissions::PermissionSet;
use super::session_store::SessionStore;
use super::types::{AuthenticatedIdentity, LocationType, UserStatus};
use crate::error::{AppError, Context, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, lerror, lwarn};

/// 解析结果
#[derive(Debug)]
pub enum SessionResolution {
    /// 会话有效
    Valid(AuthenticatedIdentity),
    /// 没有会话、会话过期或账户不可用
    Invalid,
    /// 存储层故障
    StorageError(AppError),
}

impl SessionResolution {
    /// 收敛为对外的结果：只有 `Valid` 产生身份
    #[must_use]
    pub fn into_identity(self) -> Option<AuthenticatedIdentity> {
        match self {
            Self::Valid(identity) => Some(identity),
            Self::Invalid | Self::StorageError(_) => None,
        }
    }
}

/// 会话解析器
pub struct SessionResolver {
    db: Arc<DatabaseConnection>,
    sessions: Arc<SessionStore>,
    cookie_name: String,
}

impl SessionResolver {
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        sessions: Arc<SessionStore>,
        cookie_name: impl Into<String>,
    ) -> Self {
        Self {
            db,
            sessions,
            cookie_name: cookie_name.into(),
        }
    }

    /// 从请求头中读取会话令牌
    #[must_use]
    pub fn token_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        parse_cookie(headers, &self.cookie_name)
    }

    /// 解析请求身份，任何失败都返回 `None`
    pub async fn resolve(&self, headers: &HeaderMap) -> Option<AuthenticatedIdentity> {
        self.resolve_headers(headers).await.into_identity()
    }

    /// 解析请求头，保留三态结果
    pub async fn resolve_headers(&self, headers: &HeaderMap) -> SessionResolution {
        match self.token_from_headers(headers) {
            Some(token) => self.resolve_token(&token).await,
            None => SessionResolution::Invalid,
        }
    }

    /// 解析令牌，保留三态结果
    pub async fn resolve_token(&self, token: &str) -> SessionResolution {
        match self.try_resolve(token).await {
            Ok(Some(identity)) => SessionResolution::Valid(identity),
            Ok(None) => SessionResolution::Invalid,
            Err(err) => {
                lerror!(
                    "system",
                    LogStage::Authentication,
                    LogComponent::Session,
                    "session_resolve_fail",
                    &format!("Session resolution failed, treating request as unauthenticated: {err:?}")
                );
                SessionResolution::StorageError(err)
            }
        }
    }

    async fn try_resolve(&self, token: &str) -> Result<Option<AuthenticatedIdentity>> {
        let Some(session) = self.sessions.find_valid_by_token(token).await? else {
            return Ok(None);
        };

        let user = users::Entity::find_by_id(session.user_id)
            .one(self.db.as_ref())
            .await
            .context("Failed to load session user")?;

        let user = match user {
            Some(user) if UserStatus::is_active_str(&user.status) => user,
            _ => {
                self.sessions.delete_by_id(session.id).await?;
                ldebug!(
                    "system",
                    LogStage::Authentication,
                    LogComponent::Session,
                    "stale_session_removed",
                    &format!(
                        "Removed session {} whose user {} is missing or inactive",
                        session.id, session.user_id
                    )
                );
                return Ok(None);
            }
        };

        let Some(role) = roles::Entity::find_by_id(user.role_id)
            .one(self.db.as_ref())
            .await
            .context("Failed to load user role")?
        else {
            lwarn!(
                "system",
                LogStage::Authentication,
                LogComponent::Session,
                "role_missing",
                &format!("User {} references missing role {}", user.id, user.role_id)
            );
            return Ok(None);
        };

        let Ok(permissions) = PermissionSet::from_json_str(&role.permissions) else {
            lwarn!(
                "system",
                LogStage::Authentication,
                LogComponent::Session,
                "role_permissions_corrupt",
                &format!("Role {} has unreadable permissions", role.name)
            );
            return Ok(None);
        };

        let Some(location_type) = LocationType::parse(&user.location_type) else {
            lwarn!(
                "system",
                LogStage::Authentication,
                LogComponent::Session,
                "location_type_invalid",
                &format!(
                    "User {} has unknown location type `{}`",
                    user.id, user.location_type
                )
            );
            return Ok(None);
        };

        self.spawn_touch(session.id);

        Ok(Some(AuthenticatedIdentity {
            user_id: user.id,
            email: user.email,
            name: user.name,
            emp_id: user.emp_id,
            role_id: role.id,
            role_name: role.name,
            permissions,
            franchise_id: user.franchise_id,
            location_type,
            session_id: session.id,
        }))
    }

    /// 异步刷新活动时间，不阻塞响应
    fn spawn_touch(&self, session_id: i32) {
        let sessions = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            if let Err(err) = sessions.touch(session_id).await {
                lwarn!(
                    "system",
                    LogStage::Authentication,
                    LogComponent::Session,
                    "session_touch_fail",
                    &format!("Failed to update last activity for session {session_id}: {err}")
                );
            }
        });
    }
}
