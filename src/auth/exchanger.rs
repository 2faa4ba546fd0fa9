//! # 密码交换
//!
//! 将用户名/密码交给身份提供方换取会话令牌

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::SessionToken;
use crate::config::IdentityConfig;
use crate::error::{AuthError, AuthResult, GatewayError, Result};
use crate::{
    ldebug,
    logging::{LogComponent, LogStage},
};

/// 密码交换器
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordExchanger: Send + Sync {
    /// 用用户名/密码换取会话令牌；任何失败都返回 `AuthError::ExchangeFailure`
    async fn exchange(&self, username: &str, secret: &str) -> AuthResult<SessionToken>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: Option<String>,
}

/// 基于 Identity Toolkit `signInWithPassword` 接口的密码交换器
#[derive(Debug, Clone)]
pub struct IdentityToolkitExchanger {
    http_client: reqwest::Client,
    endpoint: Url,
}

impl IdentityToolkitExchanger {
    /// 创建交换器，`api_key` 作为 `key` 查询参数附加到 `sign_in_url`
    pub fn new(http_client: reqwest::Client, config: &IdentityConfig) -> Result<Self> {
        let mut endpoint = Url::parse(&config.sign_in_url).map_err(|e| {
            GatewayError::config_with_source(format!("无效的登录地址: {}", config.sign_in_url), e)
        })?;
        endpoint
            .query_pairs_mut()
            .append_pair("key", &config.api_key);

        Ok(Self {
            http_client,
            endpoint,
        })
    }
}

#[async_trait]
impl PasswordExchanger for IdentityToolkitExchanger {
    async fn exchange(&self, username: &str, secret: &str) -> AuthResult<SessionToken> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(&SignInRequest {
                email: username,
                password: secret,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| AuthError::exchange(format!("请求身份提供方失败: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            ldebug!(
                "system",
                LogStage::Authentication,
                LogComponent::PasswordExchanger,
                "exchange",
                &format!("身份提供方拒绝了密码交换: status={status}")
            );
            return Err(AuthError::exchange(format!("身份提供方返回状态码 {status}")));
        }

        let body: SignInResponse = response
            .json()
            .await
            .map_err(|e| AuthError::exchange(format!("无法解析登录响应: {e}")))?;

        body.id_token
            .filter(|token| !token.trim().is_empty())
            .map(SessionToken::new)
            .ok_or_else(|| AuthError::exchange("登录响应缺少 idToken"))
    }
}
