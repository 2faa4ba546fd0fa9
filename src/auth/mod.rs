//! # 认证模块
//!
//! 将两种凭证形式（Basic 密码或 `X-Token-Api` 令牌）统一解析为已验证的身份。
//! 外部协作方（身份提供方登录接口、令牌验证服务）通过 trait 注入。

pub mod credential;
pub mod exchanger;
pub mod resolver;
pub mod types;
pub mod utils;
pub mod verifier;

pub use credential::{CredentialExtractor, TOKEN_HEADER};
pub use exchanger::{IdentityToolkitExchanger, PasswordExchanger};
pub use resolver::{IdentityResolver, ResolutionState};
pub use types::{Credential, Rejected, ResolvedIdentity, SessionToken};
pub use utils::AuthUtils;
pub use verifier::{IdentityProviderVerifier, TokenVerifier};

#[cfg(test)]
pub use exchanger::MockPasswordExchanger;
#[cfg(test)]
pub use verifier::MockTokenVerifier;

use std::time::Duration;

use crate::config::IdentityConfig;
use crate::error::{GatewayError, Result};

/// 构建访问身份提供方的 HTTP 客户端（连接池在所有请求间共享）
pub fn build_http_client(config: &IdentityConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout))
        .user_agent(concat!("reading-gateway/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| GatewayError::config_with_source("无法创建HTTP客户端", e))
}
