//! # 数据库配置

use crate::error::{AppError, Result};
use crate::{
    linfo,
    logging::{LogComponent, LogStage},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 数据库URL
    pub url: String,
    /// 最大连接数
    pub max_connections: u32,
    /// 连接超时时间（秒）
    pub connect_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/franchise_office.db".to_string(),
            max_connections: 10,
            connect_timeout: 30,
        }
    }
}

impl DatabaseConfig {
    /// 确保数据库路径存在（仅对SQLite文件数据库）
    pub fn ensure_database_path(&self) -> Result<()> {
        let Some(path_str) = self.sqlite_file_path() else {
            return Ok(());
        };
        let db_path = Path::new(path_str);

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::config_with_source(
                    format!("无法创建数据库目录: {}", parent.display()),
                    e,
                )
            })?;

            linfo!(
                "system",
                LogStage::Startup,
                LogComponent::Database,
                "create_db_dir",
                &format!("Created database directory {}", parent.display())
            );
        }

        if !db_path.exists() {
            std::fs::File::create(db_path).map_err(|e| {
                AppError::config_with_source(
                    format!("无法创建数据库文件: {}", db_path.display()),
                    e,
                )
            })?;
            linfo!(
                "system",
                LogStage::Startup,
                LogComponent::Database,
                "create_db_file",
                &format!("Created database file {}", db_path.display())
            );
        }

        Ok(())
    }

    /// SQLite 文件路径（内存数据库返回 `None`）
    #[must_use]
    pub fn sqlite_file_path(&self) -> Option<&str> {
        if self.is_memory_database() {
            return None;
        }
        let path = self
            .url
            .strip_prefix("sqlite://")
            .or_else(|| self.url.strip_prefix("sqlite:"))?;
        Some(path.split('?').next().unwrap_or(path))
    }

    /// 检查是否为内存数据库
    #[must_use]
    pub fn is_memory_database(&self) -> bool {
        self.url.contains(":memory:")
    }

    /// 连接超时
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_file_path() {
        let config = DatabaseConfig {
            url: "sqlite://./data/app.db?mode=rwc".to_string(),
            ..Default::default()
        };
        assert_eq!(config.sqlite_file_path(), Some("./data/app.db"));

        let memory = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..Default::default()
        };
        assert_eq!(memory.sqlite_file_path(), None);
    }

    #[test]
    fn test_ensure_database_path_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("office.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", file.display()),
            ..Default::default()
        };

        config.ensure_database_path().unwrap();
        assert!(file.exists());
    }
}
