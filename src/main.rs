//! # Reading Gateway 主程序

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use reading_gateway::{
    Result,
    auth::{IdentityProviderVerifier, IdentityResolver, IdentityToolkitExchanger, build_http_client},
    config, database, lerror, linfo,
    logging::{self, LogComponent, LogStage},
    server::{GatewayServer, GatewayState},
    storage::SeaOrmMeasurementStore,
};

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "reading-gateway", version, about)]
struct Args {
    /// 配置文件路径
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 监听端口（覆盖配置文件与环境变量）
    #[arg(short, long)]
    port: Option<u16>,

    /// 日志级别（`RUST_LOG` 优先）
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    logging::init_logging(args.log_level.as_deref());

    if let Err(e) = run(args).await {
        lerror!(
            "system",
            LogStage::Startup,
            LogComponent::Main,
            "service_start_failed",
            &format!("服务启动失败: {e:?}")
        );
        return Err(e);
    }

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "service_shutdown",
        "服务正常关闭"
    );
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let mut config = config::load_config(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate().map_err(reading_gateway::GatewayError::config)?;

    let db = database::init_database(&config.database).await?;
    database::run_migrations(&db).await?;
    database::check_database_status(&db).await?;

    let http_client = build_http_client(&config.identity)?;
    let exchanger = IdentityToolkitExchanger::new(http_client.clone(), &config.identity)?;
    let verifier = IdentityProviderVerifier::new(http_client, &config.identity)?;
    let resolver = IdentityResolver::new(Arc::new(exchanger), Arc::new(verifier));
    let store = SeaOrmMeasurementStore::new(db);

    let state = GatewayState::new(resolver, Arc::new(store));

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "service_starting",
        &format!(
            "服务启动: port={}, key_source={}",
            config.server.port,
            if config.identity.shared_secret.is_some() {
                "shared_secret"
            } else {
                "jwks"
            }
        )
    );

    GatewayServer::new(config.server, state).serve().await
}
