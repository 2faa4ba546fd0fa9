//! # 数据库配置

use crate::error::{GatewayError, Result};
use crate::{
    linfo,
    logging::{LogComponent, LogStage},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

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
            url: "sqlite://./data/reading_gateway.db".to_string(),
            max_connections: 10,
            connect_timeout: 30,
        }
    }
}

impl DatabaseConfig {
    /// 内存数据库配置（单连接，保证所有查询落在同一个库上）
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            connect_timeout: 5,
        }
    }

    /// 确保数据库路径存在（仅对SQLite文件数据库）
    pub fn ensure_database_path(&self) -> Result<()> {
        if self.is_sqlite() && !self.is_memory_database() {
            let path_str = self
                .url
                .strip_prefix("sqlite://")
                .or_else(|| self.url.strip_prefix("sqlite:"))
                .unwrap_or(&self.url);
            // 去掉查询参数，例如 `?mode=rwc`
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            let db_path = Path::new(path_str);

            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        GatewayError::config_with_source(
                            format!("无法创建数据库目录: {}", parent.display()),
                            e,
                        )
                    })?;

                    linfo!(
                        "system",
                        LogStage::Startup,
                        LogComponent::Database,
                        "create_db_dir",
                        &format!("创建数据库目录: {}", parent.display())
                    );
                }
            }

            if !db_path.exists() {
                std::fs::File::create(db_path).map_err(|e| {
                    GatewayError::config_with_source(
                        format!("无法创建数据库文件: {}", db_path.display()),
                        e,
                    )
                })?;
                linfo!(
                    "system",
                    LogStage::Startup,
                    LogComponent::Database,
                    "create_db_file",
                    &format!("数据库文件创建成功: {}", db_path.display())
                );
            }
        }

        Ok(())
    }

    /// 用于日志的数据库地址：隐藏用户信息，最多保留 50 个字符
    #[must_use]
    pub fn display_url(&self) -> String {
        let masked = match url::Url::parse(&self.url) {
            Ok(mut parsed) if !parsed.username().is_empty() || parsed.password().is_some() => {
                // sqlite 等无主机的地址无法设置用户信息，此时整体隐藏
                if parsed.set_username("***").is_ok() && parsed.set_password(None).is_ok() {
                    parsed.to_string()
                } else {
                    "***".to_string()
                }
            }
            _ => self.url.clone(),
        };
        masked.chars().take(50).collect()
    }

    /// 检查是否为内存数据库
    #[must_use]
    pub fn is_memory_database(&self) -> bool {
        self.url.contains(":memory:")
    }

    /// 检查是否为SQLite数据库
    #[must_use]
    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }
}
