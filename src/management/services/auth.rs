//! # 认证管理服务
//!
//! 登录、登出与会话查询的业务逻辑，HTTP handler 只负责 Cookie 与响应格式。

use chrono::Utc;
use entity::users;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Serialize;

use super::attendance;
use super::shared::validation::normalize_email;
use crate::app::AppContext;
use crate::auth::password::verify_password;
use crate::auth::{AuthenticatedIdentity, UserStatus};
use crate::error::{AppError, Context, Result};
use crate::logging::{LogComponent, LogStage};
use crate::management::middleware::ClientInfo;
use crate::{linfo, lwarn};

/// 登录成功后返回给前端的用户信息
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub emp_id: String,
}

/// 登录结果：原始令牌只用于写入 Cookie
#[derive(Debug, Clone)]
pub struct LoginOutput {
    pub token: String,
    pub user: LoginUser,
}

pub struct AuthManagementService<'a> {
    ctx: &'a AppContext,
}

impl<'a> AuthManagementService<'a> {
    #[must_use]
    pub const fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    /// 邮箱密码登录
    ///
    /// 账号不存在、未设置密码与密码错误返回同一个错误；密码正确但账户停用时返回
    /// [`AppError::AccountDisabled`]。
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: &ClientInfo,
    ) -> Result<LoginOutput> {
        let email = normalize_email(email)?;
        if password.is_empty() {
            return Err(AppError::validation_field("password", "Password is required"));
        }

        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(self.ctx.db.as_ref())
            .await
            .context("Failed to load user for login")?;

        let Some(user) = user else {
            return Err(Self::reject(&client.request_id, &email, "unknown account"));
        };
        let Some(password_hash) = user.password_hash.as_deref() else {
            return Err(Self::reject(&client.request_id, &email, "no password set"));
        };
        if !verify_password(password, password_hash) {
            return Err(Self::reject(&client.request_id, &email, "wrong password"));
        }
        if !UserStatus::is_active_str(&user.status) {
            lwarn!(
                &client.request_id,
                LogStage::Authentication,
                LogComponent::Auth,
                "login_disabled",
                &format!("Login refused for disabled account {}", user.id)
            );
            return Err(AppError::AccountDisabled);
        }

        let issued = self
            .ctx
            .sessions
            .create(user.id, client.user_agent(), client.ip())
            .await?;

        let login_user = LoginUser {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            emp_id: user.emp_id.clone(),
        };

        let user_id = user.id;
        let mut active: users::ActiveModel = user.into();
        active.last_login = Set(Some(Utc::now().naive_utc()));
        if let Err(e) = active.update(self.ctx.db.as_ref()).await {
            lwarn!(
                &client.request_id,
                LogStage::Authentication,
                LogComponent::Auth,
                "last_login_update_fail",
                &format!("Failed to update last_login for user {user_id}: {e}")
            );
        }

        // 审计与考勤失败只记录日志，不影响登录
        let _ = self
            .ctx
            .audit
            .record_login(user_id, client.ip(), client.user_agent())
            .await;
        let _ = attendance::record_login(self.ctx.db.as_ref(), user_id).await;

        linfo!(
            &client.request_id,
            LogStage::Authentication,
            LogComponent::Auth,
            "login_success",
            &format!("User {user_id} logged in"),
            session_id = issued.session.id
        );

        Ok(LoginOutput {
            token: issued.token,
            user: login_user,
        })
    }

    /// 登出：删除会话并写审计，始终成功
    pub async fn logout(&self, token: Option<&str>, client: &ClientInfo) {
        let Some(token) = token else {
            return;
        };

        let identity = self.ctx.resolver.resolve_token(token).await.into_identity();

        if let Err(e) = self.ctx.sessions.delete_by_token(token).await {
            lwarn!(
                &client.request_id,
                LogStage::Authentication,
                LogComponent::Auth,
                "logout_delete_fail",
                &format!("Failed to delete session on logout: {e}")
            );
        }

        if let Some(identity) = identity {
            let _ = self
                .ctx
                .audit
                .record_logout(identity.user_id, client.ip())
                .await;
            linfo!(
                &client.request_id,
                LogStage::Authentication,
                LogComponent::Auth,
                "logout",
                &format!("User {} logged out", identity.user_id)
            );
        }
    }

    /// 当前会话对应的身份
    pub async fn session(&self, headers: &axum::http::HeaderMap) -> Option<AuthenticatedIdentity> {
        self.ctx.resolver.resolve(headers).await
    }

    fn reject(request_id: &str, email: &str, reason: &str) -> AppError {
        lwarn!(
            request_id,
            LogStage::Authentication,
            LogComponent::Auth,
            "login_fail",
            &format!("Login failed for {email}: {reason}")
        );
        AppError::InvalidCredentials
    }
}
