use sea_orm_migration::prelude::*;

/// 对账发现的不一致记录（余额漂移、交易缺失等），供人工或自动修复
#[derive(DeriveIden)]
enum ConsistencyIssues {
    Table,
    Id,
    Kind,
    UserId,
    BookingId,
    Expected,
    Actual,
    Detail,
    Resolved,
    DetectedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ConsistencyIssues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ConsistencyIssues::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ConsistencyIssues::Kind).string_len(32).not_null())
                    .col(ColumnDef::new(ConsistencyIssues::UserId).uuid().null())
                    .col(ColumnDef::new(ConsistencyIssues::BookingId).uuid().null())
                    .col(ColumnDef::new(ConsistencyIssues::Expected).big_integer().null())
                    .col(ColumnDef::new(ConsistencyIssues::Actual).big_integer().null())
                    .col(ColumnDef::new(ConsistencyIssues::Detail).text().not_null())
                    .col(
                        ColumnDef::new(ConsistencyIssues::Resolved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ConsistencyIssues::DetectedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_consistency_issues_open")
                    .table(ConsistencyIssues::Table)
                    .col(ConsistencyIssues::Resolved)
                    .col(ConsistencyIssues::Kind)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(ConsistencyIssues::Table)
                    .to_owned(),
            )
            .await
    }
}
