//! # 凭证提取
//!
//! 从请求头中识别两种互斥的凭证形式：
//! - `Authorization: Basic base64(username:secret)`
//! - `X-Token-Api: <token>`
//!
//! 两者同时出现时以 `Authorization` 为准。`Authorization` 带有 `Basic` 标记但解析失败时
//! 直接视为没有凭证，不会退回到令牌头。

use axum::http::{HeaderMap, header::AUTHORIZATION};
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use super::{AuthUtils, Credential, SessionToken};
use crate::error::{AuthError, AuthResult};
use crate::{
    ldebug,
    logging::{LogComponent, LogStage},
};

/// 令牌请求头名称
pub const TOKEN_HEADER: &str = "x-token-api";

/// `Authorization` 头中的 Basic 标记
pub const BASIC_MARKER: &str = "Basic";

/// 标准字母表，解码时不关心是否带填充
const BASIC_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// 凭证提取器
pub struct CredentialExtractor;

impl CredentialExtractor {
    /// 从请求头中提取凭证
    ///
    /// `Authorization` 按原始字节读取：带有 `Basic` 标记但含非 ASCII 字节的值仍走密码路径，
    /// 以解析失败告终，不会被当作缺失而改用令牌头。
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Credential> {
        let authorization = headers
            .get(AUTHORIZATION)
            .map(|value| String::from_utf8_lossy(value.as_bytes()));

        Self::extract(
            authorization.as_deref(),
            AuthUtils::header_value(headers, TOKEN_HEADER),
        )
    }

    /// 根据 `Authorization` 与 `X-Token-Api` 的原始值提取凭证
    #[must_use]
    pub fn extract(authorization: Option<&str>, token_header: Option<&str>) -> Option<Credential> {
        if let Some(authorization) = authorization.map(str::trim).filter(|v| !v.is_empty()) {
            if authorization.contains(BASIC_MARKER) {
                return Self::decode_basic(authorization)
                    .inspect_err(|e| {
                        ldebug!(
                            "system",
                            LogStage::Authentication,
                            LogComponent::CredentialExtractor,
                            "decode_basic",
                            &format!("Basic 凭证无法解析: {}", e.kind())
                        );
                    })
                    .ok();
            }
        }

        token_header
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Credential::SessionToken(SessionToken::new(token)))
    }

    /// 解析 Basic 凭证：取方案之后的载荷，base64 解码后按第一个冒号拆分
    pub fn decode_basic(authorization: &str) -> AuthResult<Credential> {
        let payload = authorization
            .split_whitespace()
            .nth(1)
            .ok_or(AuthError::MalformedCredential)?;

        let decoded = BASIC_ENGINE
            .decode(payload)
            .map_err(|_| AuthError::MalformedCredential)?;
        let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedCredential)?;

        let (username, secret) = decoded
            .split_once(':')
            .ok_or(AuthError::MalformedCredential)?;

        Ok(Credential::InlinePassword {
            username: username.to_string(),
            secret: secret.to_string(),
        })
    }
}
