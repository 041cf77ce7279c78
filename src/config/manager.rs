//! # 配置管理器
//!
//! 加载 TOML 配置文件并应用 `OFFICE_*` 环境变量覆盖

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::AppConfig;
use crate::error::{AppError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{ldebug, linfo, lwarn};

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "FRANCHISE_OFFICE_CONFIG_PATH";
/// 环境变量覆盖前缀
pub const ENV_OVERRIDE_PREFIX: &str = "OFFICE_";

/// 配置管理器
pub struct ConfigManager {
    /// 当前配置
    config: Arc<AppConfig>,
    /// 配置文件路径，未找到文件时为 `None`
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// 创建配置管理器
    ///
    /// 优先使用 `FRANCHISE_OFFICE_CONFIG_PATH`，否则读取 `config/config.{RUST_ENV}.toml`。
    /// 默认路径下没有文件时使用内置默认值。
    pub fn new() -> Result<Self> {
        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            return Self::from_file(path);
        }

        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let default_path = PathBuf::from(format!("config/config.{env_name}.toml"));
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            lwarn!(
                "system",
                LogStage::Configuration,
                LogComponent::Config,
                "config_file_missing",
                &format!(
                    "{} not found, using built-in defaults",
                    default_path.display()
                )
            );
            Self::from_config(AppConfig::default(), None)
        }
    }

    /// 从指定文件创建配置管理器
    pub fn from_file(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref();
        let config = Self::load_config_file(config_path)?;
        Self::from_config(config, Some(config_path.to_path_buf()))
    }

    fn from_config(mut config: AppConfig, source: Option<PathBuf>) -> Result<Self> {
        let overrides = Self::collect_env_overrides(env::vars());
        Self::apply_env_overrides(&mut config, &overrides)?;
        config.validate().map_err(AppError::config)?;

        linfo!(
            "system",
            LogStage::Configuration,
            LogComponent::Config,
            "config_loaded",
            &format!(
                "Configuration loaded from {} with {} environment override(s)",
                source
                    .as_ref()
                    .map_or_else(|| "defaults".to_string(), |p| p.display().to_string()),
                overrides.len()
            )
        );

        Ok(Self {
            config: Arc::new(config),
            source,
        })
    }

    /// 获取当前配置
    #[must_use]
    pub fn config(&self) -> Arc<AppConfig> {
        Arc::clone(&self.config)
    }

    /// 配置文件路径
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// 加载配置文件
    fn load_config_file(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            return Err(AppError::config(format!(
                "配置文件不存在: {}",
                path.display()
            )));
        }

        let config_content = std::fs::read_to_string(path).map_err(|e| {
            AppError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
        })?;

        toml::from_str(&config_content).map_err(|e| {
            AppError::config_with_source(
                format!("TOML解析失败 - 配置文件: {}", path.display()),
                e,
            )
        })
    }

    /// 收集环境变量覆盖
    ///
    /// `OFFICE_SERVER_PORT` -> `server.port`
    pub fn collect_env_overrides<I>(vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        vars.into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(ENV_OVERRIDE_PREFIX)
                    .map(|config_key| (config_key.to_lowercase().replace('_', "."), value))
            })
            .collect()
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(
        config: &mut AppConfig,
        overrides: &HashMap<String, String>,
    ) -> Result<()> {
        for (path, value) in overrides {
            ldebug!(
                "system",
                LogStage::Configuration,
                LogComponent::Config,
                "env_override",
                &format!(
                    "Applying override {path} = {}",
                    if path.contains("url") { "***" } else { value }
                )
            );
            Self::apply_override_to_config(config, path, value)?;
        }
        Ok(())
    }

    /// 将环境变量覆盖应用到配置对象
    fn apply_override_to_config(config: &mut AppConfig, path: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = path.split('.').collect();

        match parts.as_slice() {
            ["server", "bind", "address"] => config.server.bind_address = value.to_string(),
            ["server", "port"] => config.server.port = parse_value(path, value)?,
            ["server", "enable", "cors"] => config.server.enable_cors = parse_value(path, value)?,
            ["server", "cors", "origins"] => {
                config.server.cors_origins = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
                    .collect();
            }
            ["server", "api", "prefix"] => config.server.api_prefix = value.to_string(),
            ["database", "url"] => config.database.url = value.to_string(),
            ["database", "max", "connections"] => {
                config.database.max_connections = parse_value(path, value)?;
            }
            ["database", "connect", "timeout"] => {
                config.database.connect_timeout = parse_value(path, value)?;
            }
            ["auth", "cookie", "name"] => config.auth.cookie_name = value.to_string(),
            ["auth", "session", "ttl", "days"] => {
                config.auth.session_ttl_days = parse_value(path, value)?;
            }
            ["auth", "secure", "cookie"] => config.auth.secure_cookie = parse_value(path, value)?,
            ["auth", "bcrypt", "cost"] => config.auth.bcrypt_cost = parse_value(path, value)?,
            ["auth", "session", "sweep", "interval", "secs"] => {
                config.auth.session_sweep_interval_secs = parse_value(path, value)?;
            }
            ["logging", "level"] => config.logging.level = value.to_string(),
            _ => {
                lwarn!(
                    "system",
                    LogStage::Configuration,
                    LogComponent::Config,
                    "unknown_env_override",
                    &format!("Unknown configuration path, ignoring override: {path}")
                );
            }
        }

        Ok(())
    }
}

fn parse_value<T>(path: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .map_err(|e| AppError::config_with_source(format!("无效的配置值 {path}: {value}"), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_collect_env_overrides_filters_prefix() {
        let overrides = ConfigManager::collect_env_overrides(vars(&[
            ("OFFICE_SERVER_PORT", "9100"),
            ("OFFICE_AUTH_SECURE_COOKIE", "true"),
            ("PATH", "/usr/bin"),
        ]));

        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides.get("server.port").map(String::as_str), Some("9100"));
        assert_eq!(
            overrides.get("auth.secure.cookie").map(String::as_str),
            Some("true")
        );
    }

    #[test]
    fn test_apply_env_overrides() {
        let mut config = AppConfig::default();
        let overrides = ConfigManager::collect_env_overrides(vars(&[
            ("OFFICE_SERVER_PORT", "9100"),
            ("OFFICE_DATABASE_URL", "sqlite::memory:"),
            ("OFFICE_AUTH_SECURE_COOKIE", "true"),
            ("OFFICE_AUTH_SESSION_TTL_DAYS", "3"),
            ("OFFICE_SERVER_CORS_ORIGINS", "https://a.example, https://b.example"),
        ]));

        ConfigManager::apply_env_overrides(&mut config, &overrides).unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.database.url, "sqlite::memory:");
        assert!(config.auth.secure_cookie);
        assert_eq!(config.auth.session_ttl_days, 3);
        assert_eq!(
            config.server.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn test_invalid_override_value_is_config_error() {
        let mut config = AppConfig::default();
        let overrides = ConfigManager::collect_env_overrides(vars(&[(
            "OFFICE_SERVER_PORT",
            "not-a-port",
        )]));

        let err = ConfigManager::apply_env_overrides(&mut config, &overrides).unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 8181

[database]
url = "sqlite::memory:"

[auth]
cookie_name = "office_session"
bcrypt_cost = 4
"#
        )
        .unwrap();

        let manager = ConfigManager::from_file(file.path()).unwrap();
        let config = manager.config();
        assert_eq!(config.server.port, 8181);
        assert_eq!(config.auth.cookie_name, "office_session");
        assert_eq!(config.auth.bcrypt_cost, 4);
        assert_eq!(manager.source(), Some(file.path()));
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = ConfigManager::from_file("/definitely/not/here.toml")
            .err()
            .unwrap();
        assert!(err.to_string().contains("配置文件不存在"));
    }
}
