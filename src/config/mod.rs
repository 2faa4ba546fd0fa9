//! # 配置管理模块
//!
//! 处理应用配置加载、验证和管理

mod app_config;
mod database;
mod manager;

pub use app_config::{AppConfig, IdentityConfig, ServerConfig};
pub use database::DatabaseConfig;
pub use manager::{CONFIG_PATH_ENV, ConfigManager, ConfigSource};

use std::path::Path;

/// 加载配置文件并应用环境变量覆盖
pub fn load_config(cli_path: Option<&Path>) -> crate::error::Result<AppConfig> {
    ConfigManager::load(cli_path)
}
