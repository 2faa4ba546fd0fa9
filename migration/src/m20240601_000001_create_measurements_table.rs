use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Measurements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Measurements::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Measurements::AccountId)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Measurements::Reading).double().not_null())
                    .col(
                        ColumnDef::new(Measurements::Valid)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Measurements::Payload).json().not_null())
                    .col(
                        ColumnDef::new(Measurements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 分区查询索引
        manager
            .create_index(
                Index::create()
                    .name("idx_measurements_account_id_created_at")
                    .table(Measurements::Table)
                    .col(Measurements::AccountId)
                    .col(Measurements::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Measurements::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Measurements {
    Table,
    Id,
    AccountId,
    Reading,
    Valid,
    Payload,
    CreatedAt,
}
