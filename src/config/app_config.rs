//! # 应用配置结构定义

use serde::{Deserialize, Serialize};

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP 服务配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 数据库配置
    #[serde(default)]
    pub database: super::DatabaseConfig,
    /// 认证与会话配置
    #[serde(default)]
    pub auth: AuthConfig,
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub bind_address: String,
    /// 监听端口
    pub port: u16,
    /// 是否启用CORS
    pub enable_cors: bool,
    /// 允许的CORS源地址
    pub cors_origins: Vec<String>,
    /// API前缀
    pub api_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
            api_prefix: "/api".to_string(),
        }
    }
}

/// 认证与会话配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 会话 Cookie 名称
    pub cookie_name: String,
    /// 会话有效期（天）
    pub session_ttl_days: i64,
    /// 是否为 Cookie 设置 Secure 标志（生产环境）
    pub secure_cookie: bool,
    /// bcrypt 计算成本
    pub bcrypt_cost: u32,
    /// 过期会话清理间隔（秒）
    pub session_sweep_interval_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "rummi_session".to_string(),
            session_ttl_days: 7,
            secure_cookie: false,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            session_sweep_interval_secs: 3600,
        }
    }
}

impl AuthConfig {
    /// 会话有效期
    #[must_use]
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session_ttl_days)
    }

    /// Cookie Max-Age（秒）
    #[must_use]
    pub fn cookie_max_age_secs(&self) -> i64 {
        self.session_ttl().num_seconds()
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 默认日志级别，`RUST_LOG` 优先
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }
        if !self.server.api_prefix.starts_with('/') {
            return Err("server.api_prefix must start with '/'".to_string());
        }

        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }

        if self.auth.cookie_name.is_empty()
            || !self
                .auth
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(format!(
                "auth.cookie_name `{}` is not a valid cookie name",
                self.auth.cookie_name
            ));
        }
        if self.auth.session_ttl_days <= 0 {
            return Err("auth.session_ttl_days must be greater than 0".to_string());
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err("auth.bcrypt_cost must be between 4 and 31".to_string());
        }
        if self.auth.session_sweep_interval_secs == 0 {
            return Err("auth.session_sweep_interval_secs must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.auth.cookie_name, "rummi_session");
        assert_eq!(config.auth.cookie_max_age_secs(), 604_800);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [auth]
            secure_cookie = true
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.api_prefix, "/api");
        assert!(config.auth.secure_cookie);
        assert_eq!(config.auth.session_ttl_days, 7);
    }

    #[test]
    fn test_rejects_bad_cookie_name() {
        let mut config = AppConfig::default();
        config.auth.cookie_name = "bad name;".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_bcrypt_cost() {
        let mut config = AppConfig::default();
        config.auth.bcrypt_cost = 2;
        assert!(config.validate().is_err());
    }
}
