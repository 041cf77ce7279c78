//! # 数据库模块
//!
//! 数据库连接和迁移管理

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::config::DatabaseConfig;
use crate::error::{AppError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{lerror, linfo, lwarn};

/// 初始化数据库连接
///
/// 对SQLite文件数据库，先确保目录和文件存在。
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Database,
        "db_connect",
        &format!("Connecting to database {}", redact_url(&config.url))
    );

    config.ensure_database_path()?;

    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .connect_timeout(config.connect_timeout())
        .sqlx_logging(false);
    if config.is_memory_database() {
        // 内存库的每个连接都是独立的数据库
        options.max_connections(1).min_connections(1);
    }

    let db = Database::connect(options).await.map_err(|e| {
        AppError::database_with_source(format!("Failed to connect to {}", redact_url(&config.url)), e)
    })?;

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Database,
        "db_connected",
        "Database connection established"
    );
    Ok(db)
}

/// 运行数据库迁移
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    let pending = ::migration::Migrator::get_pending_migrations(db).await?;
    if pending.is_empty() {
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Database,
            "migrations_current",
            "All migrations already applied"
        );
        return Ok(());
    }

    lwarn!(
        "system",
        LogStage::Startup,
        LogComponent::Database,
        "migrations_pending",
        &format!("Applying {} pending migration(s)", pending.len())
    );

    if let Err(e) = ::migration::Migrator::up(db, None).await {
        lerror!(
            "system",
            LogStage::Startup,
            LogComponent::Database,
            "migrations_fail",
            &format!("Database migration failed: {e}")
        );
        return Err(AppError::database_with_source("Database migration failed", e));
    }

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Database,
        "migrations_done",
        "Database migrations complete"
    );
    Ok(())
}

/// 日志中隐藏URL里的口令
fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_url() {
        assert_eq!(
            redact_url("postgres://user:pw@localhost/db"),
            "postgres://***@localhost/db"
        );
        assert_eq!(
            redact_url("sqlite://./data/office.db"),
            "sqlite://./data/office.db"
        );
    }

    #[tokio::test]
    async fn test_init_and_migrate_memory_database() {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            connect_timeout: 5,
        };
        let db = init_database(&config).await.unwrap();
        run_migrations(&db).await.unwrap();
        // 再次执行无待迁移项
        run_migrations(&db).await.unwrap();
    }
}
