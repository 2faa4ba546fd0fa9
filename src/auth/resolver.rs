//! # 身份解析
//!
//! 每个请求驱动一次状态机：
//! `Start -> Extracted -> Exchanged(可选) -> Verified | Rejected`。
//! 解析过程中不重试，也不缓存任何身份。

use std::sync::Arc;

use axum::http::HeaderMap;

use super::{
    Credential, CredentialExtractor, PasswordExchanger, Rejected, ResolvedIdentity, SessionToken,
    TokenVerifier,
};
use crate::{
    ldebug,
    logging::{LogComponent, LogStage},
};

/// 身份解析状态
#[derive(Debug)]
pub enum ResolutionState {
    Start(Option<Credential>),
    Extracted(Credential),
    Exchanged(SessionToken),
    Verified(ResolvedIdentity),
    Rejected,
}

/// 身份解析器
#[derive(Clone)]
pub struct IdentityResolver {
    exchanger: Arc<dyn PasswordExchanger>,
    verifier: Arc<dyn TokenVerifier>,
}

impl IdentityResolver {
    pub fn new(exchanger: Arc<dyn PasswordExchanger>, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            exchanger,
            verifier,
        }
    }

    /// 从请求头提取凭证并解析身份
    pub async fn resolve_headers(&self, headers: &HeaderMap) -> Result<ResolvedIdentity, Rejected> {
        self.resolve(CredentialExtractor::from_headers(headers)).await
    }

    /// 解析身份直到终态
    pub async fn resolve(&self, credential: Option<Credential>) -> Result<ResolvedIdentity, Rejected> {
        let mut state = ResolutionState::Start(credential);
        loop {
            state = match state {
                ResolutionState::Verified(identity) => return Ok(identity),
                ResolutionState::Rejected => return Err(Rejected),
                pending => self.advance(pending).await,
            };
        }
    }

    /// 推进一步
    pub async fn advance(&self, state: ResolutionState) -> ResolutionState {
        match state {
            ResolutionState::Start(None) => ResolutionState::Rejected,
            ResolutionState::Start(Some(credential)) => {
                ldebug!(
                    "system",
                    LogStage::Authentication,
                    LogComponent::IdentityResolver,
                    "extracted",
                    &format!("凭证类型: {}", credential.kind())
                );
                ResolutionState::Extracted(credential)
            }
            ResolutionState::Extracted(Credential::InlinePassword { username, secret }) => {
                match self.exchanger.exchange(&username, &secret).await {
                    Ok(token) => ResolutionState::Exchanged(token),
                    Err(e) => {
                        ldebug!(
                            "system",
                            LogStage::Authentication,
                            LogComponent::PasswordExchanger,
                            "exchange",
                            &format!("密码交换失败: {}", e.kind())
                        );
                        ResolutionState::Rejected
                    }
                }
            }
            ResolutionState::Extracted(Credential::SessionToken(token))
            | ResolutionState::Exchanged(token) => match self.verifier.verify(&token).await {
                Ok(identity) => ResolutionState::Verified(identity),
                Err(e) => {
                    ldebug!(
                        "system",
                        LogStage::Authentication,
                        LogComponent::TokenVerifier,
                        "verify",
                        &format!("令牌验证失败: {}", e.kind())
                    );
                    ResolutionState::Rejected
                }
            },
            terminal @ (ResolutionState::Verified(_) | ResolutionState::Rejected) => terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MockPasswordExchanger, MockTokenVerifier};
    use crate::error::AuthError;
    use serde_json::Map;

    fn identity(uid: &str) -> ResolvedIdentity {
        ResolvedIdentity::new(uid, Map::new())
    }

    fn resolver(exchanger: MockPasswordExchanger, verifier: MockTokenVerifier) -> IdentityResolver {
        IdentityResolver::new(Arc::new(exchanger), Arc::new(verifier))
    }

    fn inline(username: &str, secret: &str) -> Option<Credential> {
        Some(Credential::InlinePassword {
            username: username.to_string(),
            secret: secret.to_string(),
        })
    }

    #[tokio::test]
    async fn test_no_credential_is_rejected_without_collaborators() {
        let mut exchanger = MockPasswordExchanger::new();
        exchanger.expect_exchange().never();
        let mut verifier = MockTokenVerifier::new();
        verifier.expect_verify().never();

        let result = resolver(exchanger, verifier).resolve(None).await;
        assert_eq!(result, Err(Rejected));
    }

    #[tokio::test]
    async fn test_session_token_goes_straight_to_verification() {
        let mut exchanger = MockPasswordExchanger::new();
        exchanger.expect_exchange().never();
        let mut verifier = MockTokenVerifier::new();
        verifier
            .expect_verify()
            .withf(|token| token.as_str() == "tok")
            .times(1)
            .returning(|_| Ok(identity("uid-1")));

        let result = resolver(exchanger, verifier)
            .resolve(Some(Credential::SessionToken(SessionToken::new("tok"))))
            .await;
        assert_eq!(result, Ok(identity("uid-1")));
    }

    #[tokio::test]
    async fn test_exchanged_token_is_verified_like_caller_token() {
        let mut exchanger = MockPasswordExchanger::new();
        exchanger
            .expect_exchange()
            .withf(|username, secret| username.to_string() == "alice" && secret.to_string() == "pw")
            .times(1)
            .returning(|_, _| Ok(SessionToken::new("exchanged")));
        let mut verifier = MockTokenVerifier::new();
        verifier
            .expect_verify()
            .withf(|token| token.as_str() == "exchanged")
            .times(1)
            .returning(|_| Ok(identity("uid-alice")));

        let result = resolver(exchanger, verifier)
            .resolve(inline("alice", "pw"))
            .await;
        assert_eq!(result.unwrap().unique_id, "uid-alice");
    }

    #[tokio::test]
    async fn test_exchange_failure_skips_verification() {
        let mut exchanger = MockPasswordExchanger::new();
        exchanger
            .expect_exchange()
            .times(1)
            .returning(|_, _| Err(AuthError::exchange("INVALID_PASSWORD")));
        let mut verifier = MockTokenVerifier::new();
        verifier.expect_verify().never();

        let result = resolver(exchanger, verifier)
            .resolve(inline("alice", "wrong"))
            .await;
        assert_eq!(result, Err(Rejected));
    }

    #[tokio::test]
    async fn test_verification_failure_is_rejected_each_time() {
        let mut verifier = MockTokenVerifier::new();
        verifier
            .expect_verify()
            .times(2)
            .returning(|_| Err(AuthError::verification("expired")));

        let resolver = resolver(MockPasswordExchanger::new(), verifier);
        let credential = Some(Credential::SessionToken(SessionToken::new("stale")));

        assert_eq!(resolver.resolve(credential.clone()).await, Err(Rejected));
        assert_eq!(resolver.resolve(credential).await, Err(Rejected));
    }

    #[tokio::test]
    async fn test_advance_leaves_terminal_states_untouched() {
        let resolver = resolver(MockPasswordExchanger::new(), MockTokenVerifier::new());

        let state = resolver.advance(ResolutionState::Rejected).await;
        assert!(matches!(state, ResolutionState::Rejected));

        let state = resolver
            .advance(ResolutionState::Verified(identity("uid")))
            .await;
        assert!(matches!(state, ResolutionState::Verified(ref id) if id.unique_id == "uid"));

        let state = resolver.advance(ResolutionState::Start(None)).await;
        assert!(matches!(state, ResolutionState::Rejected));
    }
}
