//! # 应用配置结构定义

use serde::{Deserialize, Serialize};

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP 服务配置
    pub server: ServerConfig,
    /// 身份提供方配置
    pub identity: IdentityConfig,
    /// 数据库配置
    pub database: super::DatabaseConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub bind_address: String,
    /// 监听端口
    pub port: u16,
    /// 是否启用CORS
    pub enable_cors: bool,
    /// 允许的CORS源地址
    pub cors_origins: Vec<String>,
    /// 请求体最大字节数
    pub max_request_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3001,
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
            max_request_size: 100 * 1024,
        }
    }
}

/// 身份提供方配置
///
/// `shared_secret` 与 `jwks_url` 二选一：配置了 `shared_secret` 时使用 HS256 校验，
/// 否则从 `jwks_url` 拉取公钥并使用 RS256 校验。
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// 身份提供方 API Key
    pub api_key: String,
    /// 用户名/密码换取会话令牌的地址
    pub sign_in_url: String,
    /// 账户查询地址
    pub lookup_url: String,
    /// 公钥集合地址
    pub jwks_url: String,
    /// 项目ID；公钥集合模式下必填，用于校验 `iss`/`aud`
    pub project_id: Option<String>,
    /// 共享密钥（仅用于开发/测试环境）
    pub shared_secret: Option<String>,
    /// 账户查询使用的服务账户令牌
    pub service_token: Option<String>,
    /// 出站请求超时时间（秒）
    pub request_timeout: u64,
    /// 公钥缓存时间（秒）
    pub jwks_cache_ttl: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            sign_in_url: "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword"
                .to_string(),
            lookup_url: "https://identitytoolkit.googleapis.com/v1/accounts:lookup".to_string(),
            jwks_url:
                "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com"
                    .to_string(),
            project_id: None,
            shared_secret: None,
            service_token: None,
            request_timeout: 30,
            jwks_cache_ttl: 3600,
        }
    }
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("api_key", &"***")
            .field("sign_in_url", &self.sign_in_url)
            .field("lookup_url", &self.lookup_url)
            .field("jwks_url", &self.jwks_url)
            .field("project_id", &self.project_id)
            .field("shared_secret", &self.shared_secret.as_ref().map(|_| "***"))
            .field("service_token", &self.service_token.as_ref().map(|_| "***"))
            .field("request_timeout", &self.request_timeout)
            .field("jwks_cache_ttl", &self.jwks_cache_ttl)
            .finish()
    }
}

impl AppConfig {
    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be greater than 0".to_string());
        }
        if self.server.bind_address.parse::<std::net::IpAddr>().is_err() {
            return Err(format!(
                "server.bind_address is not a valid IP address: {}",
                self.server.bind_address
            ));
        }
        if self.server.max_request_size == 0 {
            return Err("server.max_request_size must be greater than 0".to_string());
        }

        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }

        for (name, value) in [
            ("identity.sign_in_url", &self.identity.sign_in_url),
            ("identity.lookup_url", &self.identity.lookup_url),
        ] {
            url::Url::parse(value).map_err(|e| format!("{name} is not a valid URL: {e}"))?;
        }

        match self.identity.shared_secret.as_deref() {
            Some("") => return Err("identity.shared_secret cannot be empty".to_string()),
            Some(_) => {}
            None => {
                url::Url::parse(&self.identity.jwks_url)
                    .map_err(|e| format!("identity.jwks_url is not a valid URL: {e}"))?;
                if self.identity.project_id.as_deref().is_none_or(str::is_empty) {
                    return Err(
                        "identity.project_id is required when verifying tokens against jwks_url"
                            .to_string(),
                    );
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwks_config(project_id: Option<&str>) -> AppConfig {
        let mut config = AppConfig::default();
        config.identity.project_id = project_id.map(ToString::to_string);
        config
    }

    #[test]
    fn test_jwks_mode_requires_project_id() {
        let err = jwks_config(None).validate().unwrap_err();
        assert!(err.contains("identity.project_id"));
        assert!(jwks_config(Some("")).validate().is_err());
        assert!(jwks_config(Some("demo-project")).validate().is_ok());
    }

    #[test]
    fn test_shared_secret_mode_does_not_need_project_id() {
        let mut config = AppConfig::default();
        config.identity.shared_secret = Some("dev-secret".to_string());
        assert!(config.validate().is_ok());

        config.identity.shared_secret = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_server_settings_are_rejected() {
        let mut config = jwks_config(Some("demo-project"));
        config.server.bind_address = "not-an-ip".to_string();
        assert!(config.validate().is_err());

        let mut config = jwks_config(Some("demo-project"));
        config.server.port = 0;
        assert!(config.validate().is_err());
    }
}
