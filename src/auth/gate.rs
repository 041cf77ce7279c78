//! # 授权门
//!
//! `require_session` 要求有效会话；`require_permission` 在此基础上检查单项权限。

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use super::permissions::{PermissionKey, has_permission};
use super::resolver::SessionResolver;
use super::types::AuthenticatedIdentity;
use crate::error::AppError;
use crate::ldebug;
use crate::logging::{LogComponent, LogStage};

/// 授权失败
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// 没有有效会话 -> 401
    #[error("Unauthorized")]
    Unauthorized,
    /// 权限不足 -> 403
    #[error("Forbidden: Insufficient permissions")]
    Forbidden,
}

impl From<GateError> for AppError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Unauthorized => Self::unauthorized(),
            GateError::Forbidden => Self::forbidden(),
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

/// 授权门
#[derive(Clone)]
pub struct AuthGate {
    resolver: Arc<SessionResolver>,
}

impl AuthGate {
    #[must_use]
    pub const fn new(resolver: Arc<SessionResolver>) -> Self {
        Self { resolver }
    }

    /// 要求有效会话
    pub async fn require_session(
        &self,
        headers: &HeaderMap,
    ) -> Result<AuthenticatedIdentity, GateError> {
        self.resolver
            .resolve(headers)
            .await
            .ok_or(GateError::Unauthorized)
    }

    /// 要求有效会话且拥有指定权限
    pub async fn require_permission(
        &self,
        headers: &HeaderMap,
        key: PermissionKey,
    ) -> Result<AuthenticatedIdentity, GateError> {
        let identity = self.require_session(headers).await?;

        if !has_permission(&identity.permissions, key) {
            ldebug!(
                "system",
                LogStage::Authorization,
                LogComponent::Permission,
                "permission_denied",
                &format!(
                    "User {} ({}) lacks {key}",
                    identity.user_id, identity.role_name
                )
            );
            return Err(GateError::Forbidden);
        }

        Ok(identity)
    }
}
