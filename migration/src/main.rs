use sea_orm_migration::prelude::*;

/// 迁移命令行入口
///
/// 需要通过 `DATABASE_URL` 指定数据库，例如 `sqlite://data/gateway.db?mode=rwc`
#[tokio::main]
async fn main() {
    cli::run_cli(migration::Migrator).await;
}
