//! # 令牌验证
//!
//! 校验会话令牌的签名与有效期，再按令牌主体向身份提供方查询账户记录。
//! 两步都成功才产生 `ResolvedIdentity`。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use moka::future::Cache;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use url::Url;

use super::{ResolvedIdentity, SessionToken};
use crate::config::IdentityConfig;
use crate::error::{AuthError, AuthResult, GatewayError, Result};
use crate::{
    ldebug, linfo,
    logging::{LogComponent, LogStage},
};

/// 安全令牌签发方前缀
const ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// 公钥集合响应上限
const MAX_JWKS_BYTES: u64 = 512 * 1024;

/// 令牌验证器
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// 验证令牌并解析身份；任何失败都返回 `AuthError::VerificationFailure`
    async fn verify(&self, token: &SessionToken) -> AuthResult<ResolvedIdentity>;
}

#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    n: Option<String>,
    e: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<Map<String, Value>>,
}

/// 以 `kid` 索引的 RSA 公钥
type KeySet = Arc<HashMap<String, Arc<DecodingKey>>>;

/// 身份提供方公钥集合
///
/// 整个集合作为一个缓存项，在 TTL 内只拉取一次；集合中不存在的 `kid` 直接拒绝，
/// 不会触发重新拉取。拉取失败不会写入缓存。
#[derive(Clone)]
struct JwksKeySource {
    http_client: reqwest::Client,
    jwks_url: Url,
    cache: Cache<(), KeySet>,
}

impl JwksKeySource {
    fn new(http_client: reqwest::Client, jwks_url: Url, ttl: Duration) -> Self {
        Self {
            http_client,
            jwks_url,
            cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    async fn key_for(&self, kid: &str) -> AuthResult<Arc<DecodingKey>> {
        let keys = self
            .cache
            .try_get_with((), self.fetch())
            .await
            .map_err(|e| e.as_ref().clone())?;

        keys.get(kid)
            .cloned()
            .ok_or_else(|| AuthError::verification(format!("未知的公钥ID: {kid}")))
    }

    async fn fetch(&self) -> AuthResult<KeySet> {
        linfo!(
            "system",
            LogStage::Authentication,
            LogComponent::TokenVerifier,
            "jwks_refresh",
            &format!("刷新身份提供方公钥集合: {}", self.jwks_url)
        );

        let response = self
            .http_client
            .get(self.jwks_url.clone())
            .send()
            .await
            .map_err(|e| AuthError::verification(format!("获取公钥集合失败: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::verification(format!(
                "公钥集合返回状态码 {}",
                response.status()
            )));
        }
        if response.content_length().is_some_and(|len| len > MAX_JWKS_BYTES) {
            return Err(AuthError::verification("公钥集合响应过大"));
        }

        let jwks: JwksResponse = response
            .json()
            .await
            .map_err(|e| AuthError::verification(format!("无法解析公钥集合: {e}")))?;

        let keys = jwks
            .keys
            .into_iter()
            .filter_map(|key| {
                let decoding_key =
                    DecodingKey::from_rsa_components(key.n.as_deref()?, key.e.as_deref()?).ok()?;
                Some((key.kid, Arc::new(decoding_key)))
            })
            .collect();

        Ok(Arc::new(keys))
    }
}

/// 签名校验所用的密钥来源
#[derive(Clone)]
enum KeySource {
    /// HS256 共享密钥（开发/测试环境）
    Shared(DecodingKey),
    /// RS256 公钥集合
    Jwks(JwksKeySource),
}

/// 基于身份提供方的令牌验证器
#[derive(Clone)]
pub struct IdentityProviderVerifier {
    http_client: reqwest::Client,
    lookup_endpoint: Url,
    service_token: Option<String>,
    keys: KeySource,
    validation: Validation,
}

impl IdentityProviderVerifier {
    pub fn new(http_client: reqwest::Client, config: &IdentityConfig) -> Result<Self> {
        let mut lookup_endpoint = Url::parse(&config.lookup_url).map_err(|e| {
            GatewayError::config_with_source(format!("无效的账户查询地址: {}", config.lookup_url), e)
        })?;
        lookup_endpoint
            .query_pairs_mut()
            .append_pair("key", &config.api_key);

        let (keys, algorithm) = match config.shared_secret.as_deref() {
            Some(secret) => (
                KeySource::Shared(DecodingKey::from_secret(secret.as_bytes())),
                Algorithm::HS256,
            ),
            None => {
                if config.project_id.as_deref().is_none_or(str::is_empty) {
                    return Err(GatewayError::config(
                        "公钥集合模式必须配置 identity.project_id",
                    ));
                }
                let jwks_url = Url::parse(&config.jwks_url).map_err(|e| {
                    GatewayError::config_with_source(
                        format!("无效的公钥集合地址: {}", config.jwks_url),
                        e,
                    )
                })?;
                (
                    KeySource::Jwks(JwksKeySource::new(
                        http_client.clone(),
                        jwks_url,
                        Duration::from_secs(config.jwks_cache_ttl),
                    )),
                    Algorithm::RS256,
                )
            }
        };

        Ok(Self {
            http_client,
            lookup_endpoint,
            service_token: config.service_token.clone(),
            keys,
            validation: Self::build_validation(algorithm, config.project_id.as_deref()),
        })
    }

    fn build_validation(algorithm: Algorithm, project_id: Option<&str>) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 30;

        match project_id {
            Some(project_id) => {
                validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
                validation.set_issuer(&[format!("{ISSUER_PREFIX}{project_id}")]);
                validation.set_audience(&[project_id]);
            }
            None => validation.validate_aud = false,
        }

        validation
    }

    /// 校验签名、有效期并返回令牌主体
    async fn verify_signature(&self, token: &SessionToken) -> AuthResult<String> {
        let key = match &self.keys {
            KeySource::Shared(key) => Arc::new(key.clone()),
            KeySource::Jwks(source) => {
                let header = decode_header(token.as_str())
                    .map_err(|e| AuthError::verification(format!("无效的令牌头: {e}")))?;
                let kid = header
                    .kid
                    .ok_or_else(|| AuthError::verification("令牌头缺少 kid"))?;
                source.key_for(&kid).await?
            }
        };

        let data = decode::<SessionClaims>(token.as_str(), &key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AuthError::verification("令牌已过期")
                }
                _ => AuthError::verification(format!("令牌校验失败: {e}")),
            }
        })?;

        let subject = data.claims.sub;
        if subject.trim().is_empty() {
            return Err(AuthError::verification("令牌主体为空"));
        }
        Ok(subject)
    }

    /// 按主体查询账户记录
    async fn lookup_account(&self, subject: &str) -> AuthResult<ResolvedIdentity> {
        let mut request = self
            .http_client
            .post(self.lookup_endpoint.clone())
            .json(&json!({ "localId": [subject] }));
        if let Some(service_token) = &self.service_token {
            request = request.bearer_auth(service_token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthError::verification(format!("账户查询请求失败: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            ldebug!(
                "system",
                LogStage::Authentication,
                LogComponent::TokenVerifier,
                "lookup_account",
                &format!("账户查询被拒绝: status={status}")
            );
            return Err(AuthError::verification(format!("账户查询返回状态码 {status}")));
        }

        let body: LookupResponse = response
            .json()
            .await
            .map_err(|e| AuthError::verification(format!("无法解析账户查询响应: {e}")))?;

        let record = body
            .users
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::verification("账户不存在"))?;
        let unique_id = record
            .get("localId")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| AuthError::verification("账户记录缺少 localId"))?;

        Ok(ResolvedIdentity::new(unique_id, record))
    }
}

#[async_trait]
impl TokenVerifier for IdentityProviderVerifier {
    async fn verify(&self, token: &SessionToken) -> AuthResult<ResolvedIdentity> {
        let subject = self.verify_signature(token).await?;
        self.lookup_account(&subject).await
    }
}
