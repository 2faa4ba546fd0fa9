//! Errors raised on the authentication path.
//!
//! Every variant collapses into the same externally visible rejection (`401`
//! with no detail). The distinctions exist only for collaborator-side logging.

use thiserror::Error;

/// The primary error type for credential extraction, exchange and verification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No usable credential shape was presented.
    #[error("no usable credential was presented")]
    MalformedCredential,

    /// The identity provider refused the username/secret pair, or could not be reached.
    #[error("password exchange failed: {0}")]
    ExchangeFailure(String),

    /// The session token is invalid or expired, or the account lookup failed.
    #[error("token verification failed: {0}")]
    VerificationFailure(String),
}

impl AuthError {
    /// 创建交换失败错误
    pub fn exchange<T: Into<String>>(message: T) -> Self {
        Self::ExchangeFailure(message.into())
    }

    /// 创建验证失败错误
    pub fn verification<T: Into<String>>(message: T) -> Self {
        Self::VerificationFailure(message.into())
    }

    /// Short machine-readable label, safe for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedCredential => "malformed_credential",
            Self::ExchangeFailure(_) => "exchange_failure",
            Self::VerificationFailure(_) => "verification_failure",
        }
    }
}
