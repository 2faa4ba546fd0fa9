//! # 认证相关类型定义

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::AuthUtils;

/// 会话令牌（不透明的 bearer 值）
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken")
            .field(&AuthUtils::sanitize_token(&self.0))
            .finish()
    }
}

/// 请求携带的凭证，两种形式互斥
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// `Authorization: Basic base64(username:secret)`
    InlinePassword { username: String, secret: String },
    /// `X-Token-Api: <token>`
    SessionToken(SessionToken),
}

impl Credential {
    /// 凭证类型标签（用于日志）
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InlinePassword { .. } => "inline_password",
            Self::SessionToken(_) => "session_token",
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InlinePassword { username, .. } => f
                .debug_struct("InlinePassword")
                .field("username", username)
                .field("secret", &"***")
                .finish(),
            Self::SessionToken(token) => f.debug_tuple("SessionToken").field(token).finish(),
        }
    }
}

/// 已验证的身份
///
/// 只由 `TokenVerifier` 产生；附加到请求后不可变，也不会跨请求缓存。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    /// 身份提供方分配的唯一ID，同时作为数据分区键
    pub unique_id: String,
    /// 身份提供方返回的账户记录
    pub attributes: Map<String, Value>,
}

impl ResolvedIdentity {
    pub fn new(unique_id: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self {
            unique_id: unique_id.into(),
            attributes,
        }
    }

    /// 读取字符串类型的账户属性
    #[must_use]
    pub fn attribute_str(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }
}

/// 无法建立身份；不携带任何细节
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Unauthorized")]
pub struct Rejected;
