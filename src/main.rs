//! # Franchise Office 主程序
//!
//! 子命令：`serve`（默认）、`migrate`、`seed`、`create-admin`

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use franchise_office::{
    Result,
    app::AppContext,
    config::{AppConfig, ConfigManager},
    database, lerror, linfo,
    logging::{self, LogComponent, LogStage},
    management::ManagementServer,
    seed::{self, AdminSeed},
};

#[derive(Parser, Debug)]
#[command(name = "franchise-office", version, about)]
struct Cli {
    /// 配置文件路径（覆盖 FRANCHISE_OFFICE_CONFIG_PATH）
    #[arg(long, env = "FRANCHISE_OFFICE_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// 迁移、写入内置角色并启动 HTTP 服务
    Serve,
    /// 只执行数据库迁移
    Migrate,
    /// 迁移、写入内置角色并创建首个超级管理员
    Seed,
    /// 只创建超级管理员，要求角色已写入
    CreateAdmin,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        lerror!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "command_failed",
            &format!("Command failed: {e:?}")
        );
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::new()?,
    };
    let config: Arc<AppConfig> = manager.config();
    logging::init_logging(Some(&config.logging.level));

    let db = database::init_database(&config.database).await?;
    database::run_migrations(&db).await?;

    let command = cli.command.unwrap_or(Command::Serve);
    if matches!(command, Command::Serve | Command::Seed) {
        seed::ensure_system_roles(&db).await?;
    }

    match command {
        Command::Migrate => Ok(()),
        Command::Seed | Command::CreateAdmin => {
            seed::ensure_admin_user(&db, &AdminSeed::from_env(), config.auth.bcrypt_cost).await?;
            Ok(())
        }
        Command::Serve => serve(config, db).await,
    }
}

async fn serve(config: Arc<AppConfig>, db: sea_orm::DatabaseConnection) -> Result<()> {
    let context = Arc::new(AppContext::new(config, Arc::new(db)));
    let sweeper = context.session_sweeper().spawn();

    let server = ManagementServer::new(Arc::clone(&context))?;
    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "service_starting",
        &format!("Franchise office listening on {}", server.bind_address())
    );

    let result = server.serve().await;
    sweeper.abort();

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "service_shutdown",
        "Service stopped"
    );
    result
}
