//! # API 响应结构
//!
//! 非认证类错误统一渲染为 `{ success, error: { code, message }, timestamp }`；
//! 认证失败只返回 `401 Unauthorized`，不带任何细节。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Rejected;
use crate::error::GatewayError;

/// 认证失败时的响应体
pub const UNAUTHORIZED_BODY: &str = "Unauthorized";

/// # 标准错误信息
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

/// # 标准错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorInfo,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorInfo {
                code: code.into(),
                message: message.into(),
            },
            timestamp: Utc::now(),
        }
    }
}

impl IntoResponse for Rejected {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, UNAUTHORIZED_BODY).into_response()
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, code) = self.to_http_response_parts();
        if status == StatusCode::UNAUTHORIZED {
            return Rejected.into_response();
        }
        (status, Json(ErrorResponse::new(code, self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_database_error_renders_payload() {
        let response = GatewayError::database("磁盘已满").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: ErrorResponse = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(!body.success);
        assert_eq!(body.error.code, "DATABASE_ERROR");
        assert!(body.error.message.contains("磁盘已满"));
    }

    #[tokio::test]
    async fn test_auth_error_hides_detail() {
        let err: GatewayError = AuthError::verification("token expired at 12:00").into();
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_string(response).await, "Unauthorized");
    }
}
