//! # 授权关卡
//!
//! 数据路由前的唯一入口：解析身份成功后把 `Arc<ResolvedIdentity>` 放入当前请求的扩展，
//! 失败则以 `401 Unauthorized` 结束请求。拒绝原因既不返回也不记录。

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::RequestId;
use crate::auth::{Rejected, ResolvedIdentity};
use crate::server::GatewayState;
use crate::{
    ldebug,
    logging::{LogComponent, LogStage},
};

/// Axum授权中间件
pub async fn authorization_gate(
    State(state): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .cloned()
        .unwrap_or_default();

    match state.resolver().resolve_headers(request.headers()).await {
        Ok(identity) => {
            ldebug!(
                request_id,
                LogStage::Authentication,
                LogComponent::AuthGate,
                "identity_attached",
                "身份验证通过"
            );
            request.extensions_mut().insert(Arc::new(identity));
            next.run(request).await
        }
        Err(rejected) => {
            ldebug!(
                request_id,
                LogStage::Authentication,
                LogComponent::AuthGate,
                "rejected",
                "请求未通过身份验证"
            );
            rejected.into_response()
        }
    }
}

/// 处理器使用的已验证身份
///
/// 请求上没有附加身份时直接以 401 拒绝，即使路由漏挂了授权关卡也不会放行。
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity(pub Arc<ResolvedIdentity>);

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedIdentity {
    type Rejection = Rejected;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Arc<ResolvedIdentity>>()
            .cloned()
            .map(Self)
            .ok_or(Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request as HttpRequest, StatusCode};
    use serde_json::Map;

    #[tokio::test]
    async fn test_extractor_rejects_without_identity() {
        let (mut parts, ()) = HttpRequest::new(()).into_parts();
        let result = AuthenticatedIdentity::from_request_parts(&mut parts, &()).await;

        let response = result.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_extractor_reads_attached_identity() {
        let (mut parts, ()) = HttpRequest::new(()).into_parts();
        parts
            .extensions
            .insert(Arc::new(ResolvedIdentity::new("uid-1", Map::new())));

        let AuthenticatedIdentity(identity) =
            AuthenticatedIdentity::from_request_parts(&mut parts, &())
                .await
                .unwrap();
        assert_eq!(identity.unique_id, "uid-1");
    }
}
