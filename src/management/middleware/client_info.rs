//! # 客户端信息提取
//!
//! 审计日志需要的客户端 IP、User-Agent 以及请求ID。

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{HeaderMap, header, request::Parts};

use super::request_id::RequestId;

/// 无法确定来源时使用的占位
pub const UNKNOWN_CLIENT_IP: &str = "unknown";

/// 请求来源信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub request_id: String,
    pub ip_address: String,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    #[must_use]
    pub fn ip(&self) -> Option<&str> {
        Some(self.ip_address.as_str())
    }

    #[must_use]
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }
}

/// 获取真实客户端IP地址（考虑代理情况）
///
/// 依次检查 `X-Forwarded-For` 的第一项、`X-Real-IP`，最后是连接地址。
#[must_use]
pub fn get_real_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(first) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return first.to_string();
    }

    if let Some(real_ip) = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return real_ip.to_string();
    }

    peer.map_or_else(|| UNKNOWN_CLIENT_IP.to_string(), |addr| addr.ip().to_string())
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0);
        let request_id = parts
            .extensions
            .get::<RequestId>()
            .map_or_else(|| "system".to_string(), ToString::to_string);
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        Ok(Self {
            request_id,
            ip_address: get_real_client_ip(&parts.headers, peer),
            user_agent,
        })
    }
}
