use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuditLogs::UserId).integer().not_null())
                    .col(ColumnDef::new(AuditLogs::Action).string_len(64).not_null())
                    .col(ColumnDef::new(AuditLogs::Module).string_len(64).not_null())
                    .col(ColumnDef::new(AuditLogs::RecordId).string_len(64))
                    .col(ColumnDef::new(AuditLogs::Details).text())
                    .col(ColumnDef::new(AuditLogs::IpAddress).string_len(64))
                    .col(ColumnDef::new(AuditLogs::UserAgent).string_len(512))
                    .col(
                        ColumnDef::new(AuditLogs::Timestamp)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 审计日志按 用户/模块/动作 + 时间 查询
        manager
            .create_index(
                Index::create()
                    .name("idx_audit_logs_user_id_timestamp")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::UserId)
                    .col(AuditLogs::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_logs_module_timestamp")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::Module)
                    .col(AuditLogs::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_logs_action_timestamp")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::Action)
                    .col(AuditLogs::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AuditLogs {
    Table,
    Id,
    UserId,
    Action,
    Module,
    RecordId,
    Details,
    IpAddress,
    UserAgent,
    Timestamp,
}
