//! # 配置管理器
//!
//! 负责定位配置文件、解析 TOML 并应用环境变量覆盖

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{GatewayError, Result};
use crate::{
    ldebug, linfo, lwarn,
    logging::{LogComponent, LogStage},
};

use super::AppConfig;

/// 显式指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "GATEWAY_CONFIG_PATH";

/// 通用覆盖前缀，例如 `GATEWAY_SERVER_PORT` -> `server.port`
const OVERRIDE_PREFIX: &str = "GATEWAY_";

/// 常用的部署环境变量及其对应的配置路径
const WELL_KNOWN_OVERRIDES: &[(&str, &str)] = &[
    ("PORT", "server.port"),
    ("IDENTITY_API_KEY", "identity.api.key"),
    ("IDENTITY_SERVICE_TOKEN", "identity.service.token"),
    ("DATABASE_URL", "database.url"),
];

/// 配置文件来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// 通过命令行或 `GATEWAY_CONFIG_PATH` 显式指定，文件必须存在
    Explicit(PathBuf),
    /// 按 `RUST_ENV` 推导的默认路径，文件缺失时使用默认配置
    Default(PathBuf),
}

impl ConfigSource {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Explicit(path) | Self::Default(path) => path,
        }
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 从进程环境加载配置
    pub fn load(cli_path: Option<&Path>) -> Result<AppConfig> {
        Self::load_with_vars(cli_path, env::vars())
    }

    /// 使用给定的环境变量集合加载配置
    pub fn load_with_vars<I>(cli_path: Option<&Path>, vars: I) -> Result<AppConfig>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let source = Self::resolve_source(cli_path, &vars);

        let mut config = match &source {
            ConfigSource::Explicit(path) => Self::load_config_file(path)?,
            ConfigSource::Default(path) if path.exists() => Self::load_config_file(path)?,
            ConfigSource::Default(path) => {
                lwarn!(
                    "system",
                    LogStage::Configuration,
                    LogComponent::Config,
                    "load_config",
                    &format!("配置文件不存在，使用默认配置: {}", path.display())
                );
                AppConfig::default()
            }
        };

        let overrides = Self::build_env_overrides(&vars);
        Self::apply_env_overrides(&mut config, &overrides)?;

        config.validate().map_err(GatewayError::config)?;

        linfo!(
            "system",
            LogStage::Configuration,
            LogComponent::Config,
            "load_config",
            &format!(
                "配置加载完成: source={}, overrides={}",
                source.path().display(),
                overrides.len()
            )
        );

        Ok(config)
    }

    /// 确定配置文件来源
    #[must_use]
    pub fn resolve_source(cli_path: Option<&Path>, vars: &HashMap<String, String>) -> ConfigSource {
        if let Some(path) = cli_path {
            return ConfigSource::Explicit(path.to_path_buf());
        }
        if let Some(path) = vars.get(CONFIG_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            return ConfigSource::Explicit(PathBuf::from(path));
        }
        let env = vars.get("RUST_ENV").map_or("dev", String::as_str);
        ConfigSource::Default(PathBuf::from(format!("config/config.{env}.toml")))
    }

    /// 加载配置文件
    fn load_config_file(path: &Path) -> Result<AppConfig> {
        if !path.exists() {
            return Err(crate::config_error!("配置文件不存在: {}", path.display()));
        }

        let config_content = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
        })?;

        toml::from_str(&config_content).map_err(|e| {
            GatewayError::config_with_source(
                format!("TOML解析失败 - 配置文件: {}, 详细错误: {e}", path.display()),
                e,
            )
        })
    }

    /// 构建环境变量覆盖映射（带前缀的变量优先于常用变量）
    fn build_env_overrides(vars: &HashMap<String, String>) -> HashMap<String, String> {
        let mut overrides = HashMap::new();

        for (name, path) in WELL_KNOWN_OVERRIDES {
            if let Some(value) = vars.get(*name) {
                overrides.insert((*path).to_string(), value.clone());
            }
        }

        for (key, value) in vars {
            if key == CONFIG_PATH_ENV {
                continue;
            }
            if let Some(config_key) = key.strip_prefix(OVERRIDE_PREFIX) {
                let config_path = config_key.to_lowercase().replace('_', ".");
                overrides.insert(config_path, value.clone());
            }
        }

        overrides
    }

    /// 应用环境变量覆盖
    fn apply_env_overrides(
        config: &mut AppConfig,
        overrides: &HashMap<String, String>,
    ) -> Result<()> {
        for (path, value) in overrides {
            ldebug!(
                "system",
                LogStage::Configuration,
                LogComponent::Config,
                "env_override",
                &format!(
                    "应用环境变量覆盖: {} = {}",
                    path,
                    if path.contains("key") || path.contains("secret") || path.contains("token") {
                        "***"
                    } else {
                        value
                    }
                )
            );

            Self::apply_override_to_config(config, path, value)?;
        }
        Ok(())
    }

    fn parse_value<T>(path: &str, value: &str) -> Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        value.trim().parse().map_err(|e| {
            GatewayError::config_with_source(format!("无效的配置值 {path}: {value}"), e)
        })
    }

    /// 将环境变量覆盖应用到配置对象
    fn apply_override_to_config(config: &mut AppConfig, path: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = path.split('.').collect();

        match parts.as_slice() {
            ["server", "bind", "address"] | ["server", "host"] => {
                config.server.bind_address = value.to_string();
            }
            ["server", "port"] => config.server.port = Self::parse_value(path, value)?,
            ["server", "enable", "cors"] => {
                config.server.enable_cors = Self::parse_value(path, value)?;
            }
            ["server", "cors", "origins"] => {
                config.server.cors_origins = value
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(ToString::to_string)
                    .collect();
            }
            ["server", "max", "request", "size"] => {
                config.server.max_request_size = Self::parse_value(path, value)?;
            }
            ["identity", "api", "key"] => config.identity.api_key = value.to_string(),
            ["identity", "sign", "in", "url"] => config.identity.sign_in_url = value.to_string(),
            ["identity", "lookup", "url"] => config.identity.lookup_url = value.to_string(),
            ["identity", "jwks", "url"] => config.identity.jwks_url = value.to_string(),
            ["identity", "project", "id"] => {
                config.identity.project_id = Some(value.to_string()).filter(|v| !v.is_empty());
            }
            ["identity", "shared", "secret"] => {
                config.identity.shared_secret = Some(value.to_string());
            }
            ["identity", "service", "token"] => {
                config.identity.service_token = Some(value.to_string()).filter(|v| !v.is_empty());
            }
            ["identity", "request", "timeout"] => {
                config.identity.request_timeout = Self::parse_value(path, value)?;
            }
            ["identity", "jwks", "cache", "ttl"] => {
                config.identity.jwks_cache_ttl = Self::parse_value(path, value)?;
            }
            ["database", "url"] => config.database.url = value.to_string(),
            ["database", "max", "connections"] => {
                config.database.max_connections = Self::parse_value(path, value)?;
            }
            ["database", "connect", "timeout"] => {
                config.database.connect_timeout = Self::parse_value(path, value)?;
            }
            _ => {
                lwarn!(
                    "system",
                    LogStage::Configuration,
                    LogComponent::Config,
                    "env_override",
                    &format!("未知的配置路径，忽略环境变量覆盖: {path}")
                );
            }
        }

        Ok(())
    }
}
